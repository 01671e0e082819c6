//! Binary structure encoding used for stored records

use crate::error::{Error, Result};
use crate::molecule::ChemObject;

/// Encode a structure to its compact binary form.
pub fn encode_object(obj: &ChemObject) -> Result<Vec<u8>> {
    Ok(bincode::serialize(obj)?)
}

/// Decode a structure previously written by [`encode_object`].
///
/// Bond endpoints are validated; a stored bond naming a missing atom is
/// reported as corruption.
pub fn decode_object(bytes: &[u8]) -> Result<ChemObject> {
    let obj: ChemObject = bincode::deserialize(bytes)?;
    let check = |mol: &crate::molecule::Molecule| -> Result<()> {
        let n = mol.atom_count();
        if mol.bonds().iter().any(|b| b.begin >= n || b.end >= n) {
            return Err(Error::Corruption(
                "stored bond refers to a missing atom".to_string(),
            ));
        }
        Ok(())
    };
    match &obj {
        ChemObject::Molecule(m) => check(m)?,
        ChemObject::Reaction(r) => {
            for m in r.reactants.iter().chain(r.products.iter()) {
                check(m)?;
            }
        }
    }
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::{parse_object, parse_smiles};

    #[test]
    fn molecule_survives_encoding() {
        let obj = ChemObject::from(parse_smiles("CC(=O)[O-]").unwrap());
        let bytes = encode_object(&obj).unwrap();
        let back = decode_object(&bytes).unwrap();
        assert_eq!(back, obj);
        let mol = back.as_molecule().unwrap();
        assert_eq!(mol.neighbors(1).len(), 3);
    }

    #[test]
    fn reaction_survives_encoding() {
        let obj = parse_object("CCO.CC(=O)O>>CCOC(C)=O").unwrap();
        let back = decode_object(&encode_object(&obj).unwrap()).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn truncated_bytes_fail() {
        let obj = ChemObject::from(parse_smiles("c1ccccc1").unwrap());
        let bytes = encode_object(&obj).unwrap();
        assert!(decode_object(&bytes[..bytes.len() / 2]).is_err());
    }
}
