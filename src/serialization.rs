use crate::error::PolyEstimatorError;
use crate::observation::Observation;
use crate::polynomial::Polynomial;

const TAG_DIRECT: u8 = 0;
const TAG_DERIVATIVE: u8 = 1;
const TAG_INTEGRAL: u8 = 2;
const TAG_INTEGRAL_INTERVAL: u8 = 3;

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PolyEstimatorError> {
        if self.pos + n > self.buf.len() {
            return Err(PolyEstimatorError::SerializationError(
                "unexpected end of buffer".into(),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, PolyEstimatorError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, PolyEstimatorError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_f64(&mut self) -> Result<f64, PolyEstimatorError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(f64::from_le_bytes(bytes))
    }

    fn read_f64_vec(&mut self) -> Result<Vec<f64>, PolyEstimatorError> {
        let len = self.read_u32()? as usize;
        (0..len).map(|_| self.read_f64()).collect()
    }

    fn read_optional_constants(&mut self) -> Result<Option<Vec<f64>>, PolyEstimatorError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.read_f64_vec()?)),
            other => Err(PolyEstimatorError::SerializationError(format!(
                "unknown constants-present flag {other}"
            ))),
        }
    }
}

fn write_f64_vec(out: &mut Vec<u8>, values: &[f64]) {
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn write_optional_constants(out: &mut Vec<u8>, constants: &Option<Vec<f64>>) {
    match constants {
        None => out.push(0),
        Some(c) => {
            out.push(1);
            write_f64_vec(out, c);
        }
    }
}

/// Serializes a [`Polynomial`] as `u32` coefficient count followed by that
/// many little-endian `f64` coefficients.
pub fn serialize_polynomial(poly: &Polynomial) -> Vec<u8> {
    let mut out = Vec::new();
    write_f64_vec(&mut out, poly.coefficients());
    out
}

pub fn deserialize_polynomial(buf: &[u8]) -> Result<Polynomial, PolyEstimatorError> {
    let mut reader = Reader::new(buf);
    let coefficients = reader.read_f64_vec()?;
    Polynomial::new(coefficients)
}

/// Serializes an [`Observation`] per the documented per-variant wire layout:
/// a one-byte tag followed by its fields in declaration order.
pub fn serialize_observation(obs: &Observation) -> Vec<u8> {
    let mut out = Vec::new();
    match obs {
        Observation::Direct { x, y } => {
            out.push(TAG_DIRECT);
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
        }
        Observation::Derivative { x, y, order } => {
            out.push(TAG_DERIVATIVE);
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
            out.extend_from_slice(&(*order as u32).to_le_bytes());
        }
        Observation::Integral {
            x,
            y,
            order,
            constants,
        } => {
            out.push(TAG_INTEGRAL);
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
            out.extend_from_slice(&(*order as u32).to_le_bytes());
            write_optional_constants(&mut out, constants);
        }
        Observation::IntegralInterval {
            start_x,
            end_x,
            y,
            order,
            constants,
        } => {
            out.push(TAG_INTEGRAL_INTERVAL);
            out.extend_from_slice(&start_x.to_le_bytes());
            out.extend_from_slice(&end_x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
            out.extend_from_slice(&(*order as u32).to_le_bytes());
            write_optional_constants(&mut out, constants);
        }
    }
    out
}

pub fn deserialize_observation(buf: &[u8]) -> Result<Observation, PolyEstimatorError> {
    let mut reader = Reader::new(buf);
    match reader.read_u8()? {
        TAG_DIRECT => {
            let x = reader.read_f64()?;
            let y = reader.read_f64()?;
            Observation::direct(x, y)
        }
        TAG_DERIVATIVE => {
            let x = reader.read_f64()?;
            let y = reader.read_f64()?;
            let order = reader.read_u32()? as usize;
            Observation::derivative(x, y, order)
        }
        TAG_INTEGRAL => {
            let x = reader.read_f64()?;
            let y = reader.read_f64()?;
            let order = reader.read_u32()? as usize;
            let constants = reader.read_optional_constants()?;
            Observation::integral(x, y, order, constants)
        }
        TAG_INTEGRAL_INTERVAL => {
            let start_x = reader.read_f64()?;
            let end_x = reader.read_f64()?;
            let y = reader.read_f64()?;
            let order = reader.read_u32()? as usize;
            let constants = reader.read_optional_constants()?;
            Observation::integral_interval(start_x, end_x, y, order, constants)
        }
        other => Err(PolyEstimatorError::SerializationError(format!(
            "unknown observation tag {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_round_trips() {
        let poly = Polynomial::new(vec![1.0, -2.5, 3.0]).unwrap();
        let bytes = serialize_polynomial(&poly);
        let back = deserialize_polynomial(&bytes).unwrap();
        assert_eq!(poly.coefficients(), back.coefficients());
    }

    #[test]
    fn direct_observation_round_trips() {
        let obs = Observation::direct(1.5, -4.0).unwrap();
        let bytes = serialize_observation(&obs);
        assert_eq!(deserialize_observation(&bytes).unwrap(), obs);
    }

    #[test]
    fn derivative_observation_round_trips() {
        let obs = Observation::derivative(2.0, 6.0, 2).unwrap();
        let bytes = serialize_observation(&obs);
        assert_eq!(deserialize_observation(&bytes).unwrap(), obs);
    }

    #[test]
    fn integral_observation_with_constants_round_trips() {
        let obs = Observation::integral(1.0, 13.5, 1, Some(vec![2.0])).unwrap();
        let bytes = serialize_observation(&obs);
        assert_eq!(deserialize_observation(&bytes).unwrap(), obs);
    }

    #[test]
    fn integral_observation_without_constants_round_trips() {
        let obs = Observation::integral(1.0, 13.5, 1, None).unwrap();
        let bytes = serialize_observation(&obs);
        assert_eq!(deserialize_observation(&bytes).unwrap(), obs);
    }

    #[test]
    fn integral_interval_observation_round_trips() {
        let obs = Observation::integral_interval(0.0, 2.0, 10.0, 1, None).unwrap();
        let bytes = serialize_observation(&obs);
        assert_eq!(deserialize_observation(&bytes).unwrap(), obs);
    }

    #[test]
    fn unknown_tag_is_a_serialization_error() {
        let bytes = vec![99u8, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = deserialize_observation(&bytes).unwrap_err();
        assert!(matches!(err, PolyEstimatorError::SerializationError(_)));
    }

    #[test]
    fn truncated_buffer_is_a_serialization_error() {
        let bytes = vec![TAG_DIRECT, 0, 0];
        let err = deserialize_observation(&bytes).unwrap_err();
        assert!(matches!(err, PolyEstimatorError::SerializationError(_)));
    }
}
