//! Stored record bodies

use serde::{Deserialize, Serialize};
use sieve_core::{decode_object, ChemObject, Error, Result};
use sieve_fingerprint::Fingerprint;

/// Record body: the encoded structure and its full fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Structure in the core binary encoding
    pub structure: Vec<u8>,
    /// `Full` fingerprint built with the database parameters
    pub fingerprint: Fingerprint,
}

impl StoredRecord {
    /// Encode as a log frame payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Decode a log frame payload.
    pub fn from_payload(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| Error::Corruption(format!("undecodable record body: {}", e)))
    }

    /// Decode the stored structure.
    pub fn object(&self) -> Result<ChemObject> {
        decode_object(&self.structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::{encode_object, parse_smiles};
    use sieve_fingerprint::{FingerprintBuilder, FingerprintKind};

    #[test]
    fn payload_roundtrip() {
        let obj = ChemObject::from(parse_smiles("C1CCNCC1").unwrap());
        let record = StoredRecord {
            structure: encode_object(&obj).unwrap(),
            fingerprint: FingerprintBuilder::default()
                .build(&obj, FingerprintKind::Full, None)
                .unwrap(),
        };
        let back = StoredRecord::from_payload(&record.to_payload().unwrap()).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.object().unwrap(), obj);
    }

    #[test]
    fn garbage_payload_is_corruption() {
        assert!(matches!(
            StoredRecord::from_payload(&[0xc1, 0x00, 0x13]),
            Err(Error::Corruption(_))
        ));
    }
}
