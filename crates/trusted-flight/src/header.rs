use crate::claims::{string_value, Claim};
use crate::error::Result;
use crate::limits::{MAX_ALG_LENGTH, MAX_TYP_LENGTH};
use miniserde::json::Object;

/// Token header
///
/// Kept as the generic decoded mapping so a present-but-mistyped `typ` or `alg`
/// is reported against that field instead of failing the whole token.
#[derive(Debug, Clone)]
pub struct DecodedHeader {
    fields: Object,
}

impl DecodedHeader {
    pub(crate) fn new(fields: Object) -> Self {
        Self { fields }
    }

    /// Token type tag (`typ`)
    pub fn token_type(&self) -> Result<&str> {
        string_value(&self.fields, Claim::Typ, MAX_TYP_LENGTH)
    }

    /// Algorithm name (`alg`)
    pub fn algorithm(&self) -> Result<&str> {
        string_value(&self.fields, Claim::Alg, MAX_ALG_LENGTH)
    }
}
