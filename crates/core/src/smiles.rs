//! Minimal SMILES reader
//!
//! Supports the organic subset, bracket atoms (isotope, hydrogen count,
//! charge; chirality and atom classes are read and discarded), bond symbols,
//! branches, ring closures (`1`..`9`, `%nn`), disconnected components and
//! reaction SMILES (`reactants>agents>products`, agents dropped).
//!
//! Full exchange-format loading lives outside this crate; this reader exists
//! so structures can be built from short strings.

use crate::error::{Error, Result};
use crate::molecule::{Atom, BondOrder, ChemObject, Element, Molecule, Reaction};
use rustc_hash::FxHashMap;

/// Parse a molecule SMILES string.
pub fn parse_smiles(input: &str) -> Result<Molecule> {
    Parser::new(input).parse()
}

/// Parse a SMILES string as a query molecule.
pub fn parse_query_smiles(input: &str) -> Result<Molecule> {
    Ok(parse_smiles(input)?.into_query())
}

/// Parse a reaction SMILES string (`A.B>>C` or `A>agent>C`).
pub fn parse_reaction_smiles(input: &str) -> Result<Reaction> {
    let parts: Vec<&str> = input.split('>').collect();
    if parts.len() != 3 {
        return Err(Error::ParseOrLoad(format!(
            "reaction SMILES needs exactly two '>' separators: '{}'",
            input
        )));
    }
    Ok(Reaction {
        reactants: parse_side(parts[0])?,
        products: parse_side(parts[2])?,
    })
}

/// Parse either a molecule or, if the string contains `>`, a reaction.
pub fn parse_object(input: &str) -> Result<ChemObject> {
    if input.contains('>') {
        Ok(ChemObject::Reaction(parse_reaction_smiles(input)?))
    } else {
        Ok(ChemObject::Molecule(parse_smiles(input)?))
    }
}

fn parse_side(side: &str) -> Result<Vec<Molecule>> {
    if side.trim().is_empty() {
        return Ok(Vec::new());
    }
    side.split('.').map(parse_smiles).collect()
}

struct PendingRing {
    atom: usize,
    order: Option<BondOrder>,
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    /// Atoms whose hydrogen count follows from default valence
    organic: Vec<bool>,
    rings: FxHashMap<u32, PendingRing>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let trimmed = input.trim();
        Parser {
            input: trimmed,
            bytes: trimmed.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            organic: Vec::new(),
            rings: FxHashMap::default(),
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::ParseOrLoad(format!("{} at position {} in '{}'", msg, self.pos, self.input))
    }

    fn parse(mut self) -> Result<Molecule> {
        if self.bytes.is_empty() {
            return Err(Error::ParseOrLoad("empty SMILES string".to_string()));
        }

        let mut prev: Option<usize> = None;
        let mut branches: Vec<Option<usize>> = Vec::new();
        let mut bond: Option<BondOrder> = None;

        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b'(' => {
                    if prev.is_none() {
                        return Err(self.error("branch without a preceding atom"));
                    }
                    branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    if bond.is_some() {
                        return Err(self.error("dangling bond before ')'"));
                    }
                    prev = branches
                        .pop()
                        .ok_or_else(|| self.error("unbalanced ')'"))?;
                    self.pos += 1;
                }
                b'-' | b'/' | b'\\' => {
                    bond = Some(BondOrder::Single);
                    self.pos += 1;
                }
                b'=' => {
                    bond = Some(BondOrder::Double);
                    self.pos += 1;
                }
                b'#' => {
                    bond = Some(BondOrder::Triple);
                    self.pos += 1;
                }
                b':' => {
                    bond = Some(BondOrder::Aromatic);
                    self.pos += 1;
                }
                b'.' => {
                    if bond.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => {
                    let atom = prev.ok_or_else(|| self.error("ring closure without an atom"))?;
                    let number = self.ring_number()?;
                    self.ring_closure(atom, number, bond.take())?;
                }
                _ => {
                    let atom = self.atom()?;
                    if let Some(p) = prev {
                        let order = bond.take().unwrap_or_else(|| self.default_order(p, atom));
                        self.mol
                            .add_bond(p, atom, order)
                            .map_err(|e| self.error(&e.to_string()))?;
                    } else if bond.is_some() {
                        return Err(self.error("bond symbol without a preceding atom"));
                    }
                    prev = Some(atom);
                }
            }
        }

        if bond.is_some() {
            return Err(self.error("dangling bond at end of input"));
        }
        if !branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(number) = self.rings.keys().next() {
            return Err(Error::ParseOrLoad(format!(
                "unclosed ring {} in '{}'",
                number, self.input
            )));
        }

        self.assign_implicit_hydrogens();
        Ok(self.mol)
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn ring_number(&mut self) -> Result<u32> {
        if self.bytes[self.pos] == b'%' {
            let digits = self
                .input
                .get(self.pos + 1..self.pos + 3)
                .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
                .ok_or_else(|| self.error("'%' must be followed by two digits"))?;
            self.pos += 3;
            digits
                .parse()
                .map_err(|_| self.error("invalid ring number"))
        } else {
            let d = (self.bytes[self.pos] - b'0') as u32;
            self.pos += 1;
            Ok(d)
        }
    }

    fn ring_closure(&mut self, atom: usize, number: u32, order: Option<BondOrder>) -> Result<()> {
        match self.rings.remove(&number) {
            None => {
                self.rings.insert(number, PendingRing { atom, order });
                Ok(())
            }
            Some(open) => {
                if let (Some(a), Some(b)) = (open.order, order) {
                    if a != b {
                        return Err(self.error("conflicting ring closure bond orders"));
                    }
                }
                let order = order
                    .or(open.order)
                    .unwrap_or_else(|| self.default_order(open.atom, atom));
                self.mol
                    .add_bond(open.atom, atom, order)
                    .map_err(|e| self.error(&e.to_string()))?;
                Ok(())
            }
        }
    }

    fn atom(&mut self) -> Result<usize> {
        if self.bytes[self.pos] == b'[' {
            return self.bracket_atom();
        }

        let rest = &self.input[self.pos..];
        let (symbol, aromatic, len) = if rest.starts_with("Cl") {
            ("Cl", false, 2)
        } else if rest.starts_with("Br") {
            ("Br", false, 2)
        } else {
            match self.bytes[self.pos] {
                b'B' => ("B", false, 1),
                b'C' => ("C", false, 1),
                b'N' => ("N", false, 1),
                b'O' => ("O", false, 1),
                b'P' => ("P", false, 1),
                b'S' => ("S", false, 1),
                b'F' => ("F", false, 1),
                b'I' => ("I", false, 1),
                b'b' => ("B", true, 1),
                b'c' => ("C", true, 1),
                b'n' => ("N", true, 1),
                b'o' => ("O", true, 1),
                b'p' => ("P", true, 1),
                b's' => ("S", true, 1),
                b'*' => ("*", false, 1),
                _ => return Err(self.error("unexpected character")),
            }
        };
        self.pos += len;

        let element = Element::from_symbol(symbol).unwrap_or(Element::ANY);
        let idx = self
            .mol
            .add_atom(Atom::new(element).with_aromatic(aromatic));
        self.organic.push(element != Element::ANY);
        Ok(idx)
    }

    fn bracket_atom(&mut self) -> Result<usize> {
        let close = self.input[self.pos..]
            .find(']')
            .map(|off| self.pos + off)
            .ok_or_else(|| self.error("unterminated bracket atom"))?;
        let body = &self.input[self.pos + 1..close];
        let b = body.as_bytes();
        let mut i = 0;

        let mut isotope: u16 = 0;
        while i < b.len() && b[i].is_ascii_digit() {
            isotope = isotope
                .checked_mul(10)
                .and_then(|v| v.checked_add((b[i] - b'0') as u16))
                .ok_or_else(|| self.error("isotope out of range"))?;
            i += 1;
        }

        let (element, aromatic) = {
            let two = body.get(i..i + 2);
            let one = body.get(i..i + 1).unwrap_or("");
            if let Some(e) = two.and_then(Element::from_symbol) {
                i += 2;
                (e, false)
            } else if let Some(e) = two.and_then(aromatic_bracket_symbol) {
                i += 2;
                (e, true)
            } else if one == "*" {
                i += 1;
                (Element::ANY, false)
            } else if let Some(e) = Element::from_symbol(one) {
                i += 1;
                (e, false)
            } else if let Some(e) = aromatic_bracket_symbol(one) {
                i += 1;
                (e, true)
            } else {
                return Err(self.error("unknown element in bracket atom"));
            }
        };

        while i < b.len() && b[i] == b'@' {
            i += 1;
        }
        // Tetrahedral class suffixes such as @TH1 / @SP2 are not supported.
        if i < b.len() && b[i].is_ascii_uppercase() && b[i] != b'H' {
            return Err(self.error("unsupported chirality specification"));
        }

        let mut hydrogens: u8 = 0;
        if i < b.len() && b[i] == b'H' {
            i += 1;
            hydrogens = 1;
            if i < b.len() && b[i].is_ascii_digit() {
                hydrogens = b[i] - b'0';
                i += 1;
            }
        }

        let mut charge: i8 = 0;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            let sign: i8 = if b[i] == b'+' { 1 } else { -1 };
            let symbol = b[i];
            i += 1;
            let mut magnitude: i8 = 1;
            if i < b.len() && b[i].is_ascii_digit() {
                magnitude = (b[i] - b'0') as i8;
                i += 1;
            } else {
                while i < b.len() && b[i] == symbol {
                    magnitude = magnitude
                        .checked_add(1)
                        .ok_or_else(|| self.error("formal charge out of range"))?;
                    i += 1;
                }
            }
            charge = sign * magnitude;
        }

        if i < b.len() && b[i] == b':' {
            i += 1;
            while i < b.len() && b[i].is_ascii_digit() {
                i += 1;
            }
        }

        if i != b.len() {
            return Err(self.error("unexpected content in bracket atom"));
        }

        self.pos = close + 1;
        let mut atom = Atom::new(element)
            .with_hydrogens(hydrogens)
            .with_charge(charge)
            .with_aromatic(aromatic);
        atom.isotope = isotope;
        let idx = self.mol.add_atom(atom);
        self.organic.push(false);
        Ok(idx)
    }

    fn assign_implicit_hydrogens(&mut self) {
        for idx in 0..self.mol.atom_count() {
            if !self.organic[idx] {
                continue;
            }
            let hydrogens = implicit_hydrogens(&self.mol, idx);
            self.mol.atom_mut(idx).hydrogens = hydrogens;
        }
    }
}

/// Hydrogen count a SMILES reader infers for an organic-subset atom.
///
/// Aromatic bonds count as single bonds, plus one for the atom's aromatic
/// participation; aromatic atoms only consider their lowest valence.
pub(crate) fn implicit_hydrogens(mol: &Molecule, idx: usize) -> u8 {
    let atom = mol.atom(idx);
    let valences = default_valences(atom.element);
    let mut used: u32 = mol
        .neighbors(idx)
        .iter()
        .map(|(_, b)| match mol.bond(*b).order {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        })
        .sum();
    if atom.aromatic {
        used += 1;
    }
    let candidates: &[u32] = if atom.aromatic {
        &valences[..valences.len().min(1)]
    } else {
        valences
    };
    candidates
        .iter()
        .find(|&&v| v >= used)
        .map(|&v| (v - used) as u8)
        .unwrap_or(0)
}

/// True for elements written without brackets.
pub(crate) fn is_organic_subset(element: Element) -> bool {
    !default_valences(element).is_empty()
}

fn aromatic_bracket_symbol(symbol: &str) -> Option<Element> {
    match symbol {
        "b" => Some(Element::B),
        "c" => Some(Element::C),
        "n" => Some(Element::N),
        "o" => Some(Element::O),
        "p" => Some(Element::P),
        "s" => Some(Element::S),
        "se" => Element::from_symbol("Se"),
        "as" => Element::from_symbol("As"),
        _ => None,
    }
}

fn default_valences(element: Element) -> &'static [u32] {
    match element {
        Element::B => &[3],
        Element::C => &[4],
        Element::N => &[3, 5],
        Element::O => &[2],
        Element::P => &[3, 5],
        Element::S => &[2, 4, 6],
        Element::F | Element::CL | Element::BR | Element::I => &[1],
        _ => &[],
    }
}
