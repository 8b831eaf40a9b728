//! Bundles of bits named `name[0]`, `name[1]`, ... grouped into words.

use std::collections::{BTreeMap, HashMap, HashSet};

use eyre::{ensure, eyre};

use crate::aig::Valuation;

/// Values of named words, least significant bit first.
pub type WordValuation = BTreeMap<String, Vec<bool>>;

pub fn bit_name(root: &str, index: usize) -> String {
    format!("{}[{}]", root, index)
}

/// Splits `name[i]` into `("name", i)`.
pub fn unpack_name(name: &str) -> Option<(&str, usize)> {
    let rest = name.strip_suffix(']')?;
    let (root, index) = rest.rsplit_once('[')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((root, index.parse().ok()?))
}

/// Mapping from word names to their sizes.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BundleMap(BTreeMap<String, usize>);

impl BundleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, size: usize) -> Option<usize> {
        self.0.insert(name.into(), size)
    }

    pub fn size(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, &size)| (name.as_str(), size))
    }

    /// Bit names of the word `name`.
    pub fn bits(&self, name: &str) -> Option<Vec<String>> {
        let size = self.size(name)?;
        Some((0..size).map(|i| bit_name(name, i)).collect())
    }

    /// All bit names, word by word.
    pub fn all_bits(&self) -> impl Iterator<Item = String> + '_ {
        self.0
            .iter()
            .flat_map(|(name, &size)| (0..size).map(move |i| bit_name(name, i)))
    }

    /// Splits word values into bit values.
    pub fn blast(&self, values: &WordValuation) -> eyre::Result<Valuation> {
        let mut bits = Valuation::new();
        for (name, size) in self.iter() {
            let word = values
                .get(name)
                .ok_or_else(|| eyre!("Missing value for '{}'", name))?;
            ensure!(
                word.len() == size,
                "Value for '{}' has {} bits, expected {}",
                name,
                word.len(),
                size
            );
            for (i, &bit) in word.iter().enumerate() {
                bits.insert(bit_name(name, i), bit);
            }
        }
        Ok(bits)
    }

    /// Like [`BundleMap::blast`], but only for the words present in `values`.
    pub fn blast_partial(&self, values: &WordValuation) -> eyre::Result<Valuation> {
        let present = self.restrict(values.keys().map(|s| s.as_str()));
        present.blast(values)
    }

    /// Collects bit values into word values. Words with missing bits are skipped.
    pub fn unblast(&self, bits: &Valuation) -> WordValuation {
        self.0
            .iter()
            .filter_map(|(name, &size)| {
                let word = (0..size)
                    .map(|i| bits.get(&bit_name(name, i)).copied())
                    .collect::<Option<Vec<bool>>>()?;
                Some((name.clone(), word))
            })
            .collect()
    }

    pub fn relabel(&self, mapping: &HashMap<String, String>) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, &size)| (mapping.get(name).unwrap_or(name).clone(), size))
                .collect(),
        )
    }

    pub fn omit<K: AsRef<str>>(&self, names: impl IntoIterator<Item = K>) -> Self {
        let mut map = self.0.clone();
        for name in names {
            map.remove(name.as_ref());
        }
        Self(map)
    }

    /// Keeps only the given names.
    pub fn restrict<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: HashSet<&str> = names.into_iter().collect();
        Self(
            self.0
                .iter()
                .filter(|(name, _)| names.contains(name.as_str()))
                .map(|(name, &size)| (name.clone(), size))
                .collect(),
        )
    }

    /// Union of both maps; sizes from `other` win on shared names.
    pub fn merge(&self, other: &BundleMap) -> Self {
        let mut map = self.0.clone();
        map.extend(other.0.iter().map(|(name, &size)| (name.clone(), size)));
        Self(map)
    }

    /// Whether every name present in both maps has the same size.
    pub fn agrees_with(&self, other: &BundleMap) -> bool {
        self.0
            .iter()
            .all(|(name, &size)| other.size(name).map_or(true, |s| s == size))
    }
}

impl<K: Into<String>> FromIterator<(K, usize)> for BundleMap {
    fn from_iter<T: IntoIterator<Item = (K, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Little-endian encoding of `value` in `wordlen` bits.
/// Signed values use two's complement.
pub fn encode_int(wordlen: usize, value: i64, signed: bool) -> eyre::Result<Vec<bool>> {
    let fits = if signed {
        ensure!(wordlen > 0, "Signed words need at least one bit");
        wordlen >= 64 || {
            let half = 1i64 << (wordlen - 1);
            -half <= value && value < half
        }
    } else {
        value >= 0 && (wordlen >= 63 || value < 1i64 << wordlen)
    };
    ensure!(
        fits,
        "Value {} does not fit into {} {} bits",
        value,
        wordlen,
        if signed { "signed" } else { "unsigned" }
    );
    Ok(wrap_int(wordlen, value))
}

/// Little-endian two's complement encoding of `value`,
/// truncated (or sign-extended) to `wordlen` bits.
pub fn wrap_int(wordlen: usize, value: i64) -> Vec<bool> {
    (0..wordlen)
        .map(|i| (value >> i.min(63)) & 1 == 1)
        .collect()
}

/// Decodes little-endian bits. Words wider than 64 bits are truncated.
pub fn decode_int(bits: &[bool], signed: bool) -> i64 {
    let mut value: i64 = 0;
    for (i, &bit) in bits.iter().enumerate().take(64) {
        if bit {
            value |= 1 << i;
        }
    }
    if signed && bits.len() < 64 && bits.last() == Some(&true) {
        value |= -1i64 << bits.len();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_name() {
        assert_eq!(unpack_name("x[3]"), Some(("x", 3)));
        assert_eq!(unpack_name("a[b][12]"), Some(("a[b]", 12)));
        assert_eq!(unpack_name("x##time_2[0]"), Some(("x##time_2", 0)));
        assert_eq!(unpack_name("x"), None);
        assert_eq!(unpack_name("x[]"), None);
        assert_eq!(unpack_name("x[-1]"), None);
    }

    #[test]
    fn test_blast_unblast() {
        let map: BundleMap = [("x", 2), ("y", 1)].into_iter().collect();
        let words = WordValuation::from([
            ("x".to_string(), vec![true, false]),
            ("y".to_string(), vec![true]),
        ]);
        let bits = map.blast(&words).unwrap();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits["x[0]"], true);
        assert_eq!(bits["x[1]"], false);
        assert_eq!(map.unblast(&bits), words);
    }

    #[test]
    fn test_blast_errors() {
        let map: BundleMap = [("x", 2)].into_iter().collect();
        assert!(map.blast(&WordValuation::new()).is_err());
        let words = WordValuation::from([("x".to_string(), vec![true])]);
        assert!(map.blast(&words).is_err());
    }

    #[test]
    fn test_merge_omit_agree() {
        let a: BundleMap = [("x", 2), ("y", 1)].into_iter().collect();
        let b: BundleMap = [("y", 3)].into_iter().collect();
        assert!(!a.agrees_with(&b));
        assert_eq!(a.merge(&b).size("y"), Some(3));
        assert_eq!(a.omit(["y"]).names().collect::<Vec<_>>(), vec!["x"]);
        assert!(a.omit(["y"]).agrees_with(&b));
    }

    #[test]
    fn test_encode_int() {
        assert_eq!(encode_int(3, 5, false).unwrap(), vec![true, false, true]);
        assert_eq!(encode_int(3, -1, true).unwrap(), vec![true, true, true]);
        assert!(encode_int(3, 8, false).is_err());
        assert!(encode_int(3, -1, false).is_err());
        assert!(encode_int(3, 4, true).is_err());
        assert!(encode_int(3, -5, true).is_err());
        assert_eq!(encode_int(3, -4, true).unwrap(), vec![false, false, true]);
    }

    #[test]
    fn test_decode_int() {
        assert_eq!(decode_int(&[true, false, true], false), 5);
        assert_eq!(decode_int(&[true, false, true], true), -3);
        assert_eq!(decode_int(&wrap_int(8, -100), true), -100);
        assert_eq!(decode_int(&wrap_int(4, 17), false), 1);
    }
}
