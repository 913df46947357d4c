use crate::error::BoxError;
use crate::models::Tx;

// Turns an encoded transaction into a decoded one
pub trait TxDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<Tx, BoxError>;
}

// Plain functions and closures work as decoders
impl<F> TxDecoder for F
where
    F: Fn(&[u8]) -> Result<Tx, BoxError> + Send + Sync,
{
    fn decode(&self, raw: &[u8]) -> Result<Tx, BoxError> {
        self(raw)
    }
}

// Decodes amino-JSON encoded transactions: {"msg": [{"type": .., "value": ..}], "memo": ..}
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTxDecoder;

impl TxDecoder for JsonTxDecoder {
    fn decode(&self, raw: &[u8]) -> Result<Tx, BoxError> {
        // StdTx documents may come wrapped as {"type": "cosmos-sdk/StdTx", "value": {...}}
        let doc: serde_json::Value = serde_json::from_slice(raw)?;
        let body = match doc.get("value") {
            Some(inner) if doc.get("msg").is_none() => inner.clone(),
            _ => doc,
        };
        if !body.is_object() {
            return Err("transaction is not a JSON object".into());
        }
        Ok(serde_json::from_value(body)?)
    }
}
