use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::path::Path;

use eyre::{bail, ensure, eyre};

use crate::aig::{Aig, SymbolType, UnrollOptions};
use crate::bundle::{bit_name, unpack_name, BundleMap, WordValuation};

/// And-Inverter Graph whose inputs, outputs and latches are grouped into bit-vectors.
///
/// Bit `i` of the word `name` is the AIG symbol `name[i]`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AigBv {
    aig: Aig,
    imap: BundleMap,
    omap: BundleMap,
    lmap: BundleMap,
}

impl AigBv {
    /// Wraps `aig`, checking that every bit of every bundle exists in it.
    pub fn new(aig: Aig, imap: BundleMap, omap: BundleMap, lmap: BundleMap) -> eyre::Result<Self> {
        for bit in imap.all_bits() {
            ensure!(aig.input(&bit).is_some(), "Missing input bit '{}'", bit);
        }
        for bit in omap.all_bits() {
            ensure!(aig.output(&bit).is_some(), "Missing output bit '{}'", bit);
        }
        for bit in lmap.all_bits() {
            ensure!(aig.latch(&bit).is_some(), "Missing latch bit '{}'", bit);
        }
        Ok(Self::from_parts(aig, imap, omap, lmap))
    }

    pub(crate) fn from_parts(aig: Aig, imap: BundleMap, omap: BundleMap, lmap: BundleMap) -> Self {
        Self {
            aig,
            imap,
            omap,
            lmap,
        }
    }

    /// Lifts a bit-level circuit: every symbol `n` becomes a 1-bit word `n` with the bit `n[0]`.
    pub fn from_aig(aig: &Aig) -> Self {
        fn lift<'a>(names: impl Iterator<Item = &'a str>) -> (HashMap<String, String>, BundleMap) {
            let mut relabels = HashMap::new();
            let mut map = BundleMap::new();
            for name in names {
                relabels.insert(name.to_owned(), bit_name(name, 0));
                map.insert(name, 1);
            }
            (relabels, map)
        }

        let (inputs, imap) = lift(aig.inputs());
        let (outputs, omap) = lift(aig.outputs());
        let (latches, lmap) = lift(aig.latches());
        let aig = aig
            .relabel_unchecked(SymbolType::Input, &inputs)
            .relabel_unchecked(SymbolType::Output, &outputs)
            .relabel_unchecked(SymbolType::Latch, &latches);
        Self::from_parts(aig, imap, omap, lmap)
    }

    /// Groups the `name[i]` symbols of `aig` into words.
    /// Indices of each word must be exactly `0..n`.
    pub fn rebundle(aig: Aig) -> eyre::Result<Self> {
        fn bundle<'a>(names: impl Iterator<Item = &'a str>) -> eyre::Result<BundleMap> {
            let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for name in names {
                let (root, index) =
                    unpack_name(name).ok_or_else(|| eyre!("'{}' is not a bit name", name))?;
                groups.entry(root).or_default().push(index);
            }
            let mut map = BundleMap::new();
            for (root, mut indices) in groups {
                indices.sort_unstable();
                let contiguous = indices.iter().enumerate().all(|(i, &index)| i == index);
                ensure!(contiguous, "Bits of '{}' are not numbered 0..{}", root, indices.len());
                map.insert(root, indices.len());
            }
            Ok(map)
        }

        let imap = bundle(aig.inputs())?;
        let omap = bundle(aig.outputs())?;
        let lmap = bundle(aig.latches())?;
        Ok(Self::from_parts(aig, imap, omap, lmap))
    }
}

impl AigBv {
    pub fn aig(&self) -> &Aig {
        &self.aig
    }
    pub fn imap(&self) -> &BundleMap {
        &self.imap
    }
    pub fn omap(&self) -> &BundleMap {
        &self.omap
    }
    pub fn lmap(&self) -> &BundleMap {
        &self.lmap
    }

    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.imap.names()
    }
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.omap.names()
    }
    pub fn latches(&self) -> impl Iterator<Item = &str> {
        self.lmap.names()
    }

    pub fn latch2init(&self) -> WordValuation {
        self.lmap.unblast(&self.aig.latch2init())
    }

    /// Evaluates one step on word values.
    ///
    /// Returns output words and next latch words.
    /// Latch words not given start at their initial values.
    pub fn eval(
        &self,
        inputs: &WordValuation,
        latches: Option<&WordValuation>,
    ) -> eyre::Result<(WordValuation, WordValuation)> {
        let inputs = self.imap.blast(inputs)?;
        let latches = latches
            .map(|latches| self.lmap.blast_partial(latches))
            .transpose()?;
        let (outputs, next) = self.aig.eval(&inputs, latches.as_ref())?;
        Ok((self.omap.unblast(&outputs), self.lmap.unblast(&next)))
    }

    /// Runs the circuit over a sequence of word valuations.
    pub fn simulate(
        &self,
        inputs: &[WordValuation],
        latches: Option<&WordValuation>,
    ) -> eyre::Result<Vec<(WordValuation, WordValuation)>> {
        let mut state = match latches {
            Some(latches) => latches.clone(),
            None => self.latch2init(),
        };
        let mut trace = Vec::with_capacity(inputs.len());
        for step in inputs {
            let (outputs, next) = self.eval(step, Some(&state))?;
            state = next.clone();
            trace.push((outputs, next));
        }
        Ok(trace)
    }

    fn interface(&self, other: &AigBv) -> Vec<String> {
        self.outputs()
            .filter(|o| other.imap.contains(o))
            .map(|o| o.to_owned())
            .collect()
    }

    /// Sequential composition: output words of `self` feed the input words of `other`
    /// with the same names.
    pub fn seq(&self, other: &AigBv) -> eyre::Result<AigBv> {
        let interface = self.interface(other);
        for name in interface.iter() {
            ensure!(
                self.omap.size(name) == other.imap.size(name),
                "Word '{}' has {:?} bits on the left and {:?} on the right",
                name,
                self.omap.size(name),
                other.imap.size(name)
            );
        }
        if let Some(latch) = self.latches().find(|l| other.lmap.contains(l)) {
            bail!("Latch '{}' is present in both circuits", latch);
        }
        let interface_set: HashSet<&str> = interface.iter().map(|s| s.as_str()).collect();
        if let Some(output) = self
            .outputs()
            .filter(|o| !interface_set.contains(o))
            .find(|o| other.omap.contains(o))
        {
            bail!("Output '{}' is present in both circuits", output);
        }
        ensure!(
            self.imap.agrees_with(&other.imap.omit(&interface)),
            "Shared inputs have different sizes"
        );
        Ok(self.seq_unchecked(other))
    }

    pub(crate) fn seq_unchecked(&self, other: &AigBv) -> AigBv {
        let interface = self.interface(other);
        AigBv {
            aig: self.aig.seq_unchecked(&other.aig),
            imap: self.imap.merge(&other.imap.omit(&interface)),
            omap: other.omap.merge(&self.omap.omit(&interface)),
            lmap: self.lmap.merge(&other.lmap),
        }
    }

    /// Parallel composition: input words with the same names are shared.
    pub fn par(&self, other: &AigBv) -> eyre::Result<AigBv> {
        if let Some(output) = self.outputs().find(|o| other.omap.contains(o)) {
            bail!("Output '{}' is present in both circuits", output);
        }
        if let Some(latch) = self.latches().find(|l| other.lmap.contains(l)) {
            bail!("Latch '{}' is present in both circuits", latch);
        }
        ensure!(
            self.imap.agrees_with(&other.imap),
            "Shared inputs have different sizes"
        );
        Ok(self.par_unchecked(other))
    }

    pub(crate) fn par_unchecked(&self, other: &AigBv) -> AigBv {
        AigBv {
            aig: self.aig.par_unchecked(&other.aig),
            imap: self.imap.merge(&other.imap),
            omap: self.omap.merge(&other.omap),
            lmap: self.lmap.merge(&other.lmap),
        }
    }

    fn bundle(&self, kind: SymbolType) -> &BundleMap {
        match kind {
            SymbolType::Input => &self.imap,
            SymbolType::Output => &self.omap,
            SymbolType::Latch => &self.lmap,
        }
    }

    /// Renames words (and all their bits).
    pub fn relabel<K, V>(
        &self,
        kind: SymbolType,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> eyre::Result<AigBv>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mapping: HashMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.into()))
            .collect();
        let bundle = self.bundle(kind);
        let mut renamed = HashSet::with_capacity(bundle.len());
        for name in bundle.names() {
            let new = mapping.get(name).map_or(name, |s| s.as_str());
            ensure!(
                renamed.insert(new),
                "Relabeling {:?} '{}' clashes with another word '{}'",
                kind,
                name,
                new
            );
        }
        Ok(self.relabel_unchecked(kind, &mapping))
    }

    pub(crate) fn relabel_unchecked(
        &self,
        kind: SymbolType,
        mapping: &HashMap<String, String>,
    ) -> AigBv {
        let bundle = self.bundle(kind);
        let mut bits = HashMap::new();
        for (name, size) in bundle.iter() {
            if let Some(new) = mapping.get(name) {
                for i in 0..size {
                    bits.insert(bit_name(name, i), bit_name(new, i));
                }
            }
        }
        let relabeled = bundle.relabel(mapping);
        let aig = self.aig.relabel_unchecked(kind, &bits);
        let mut result = AigBv {
            aig,
            ..self.clone()
        };
        match kind {
            SymbolType::Input => result.imap = relabeled,
            SymbolType::Output => result.omap = relabeled,
            SymbolType::Latch => result.lmap = relabeled,
        }
        result
    }

    /// Closes loops at the word level: each input word `inputs[k]` is driven by a new latch word
    /// `latches[k]` (default: the input name) whose next state is the output word `outputs[k]`.
    pub fn feedback(
        &self,
        inputs: &[&str],
        outputs: &[&str],
        initials: Option<&[Vec<bool>]>,
        latches: Option<&[&str]>,
        keep_outputs: bool,
    ) -> eyre::Result<AigBv> {
        let latches = latches.unwrap_or(inputs);
        ensure!(
            inputs.len() == outputs.len() && inputs.len() == latches.len(),
            "Feedback needs as many inputs, outputs and latches"
        );
        if let Some(initials) = initials {
            ensure!(
                initials.len() == inputs.len(),
                "Feedback needs one initial value per input"
            );
        }

        let mut input_bits = Vec::new();
        let mut output_bits = Vec::new();
        let mut latch_bits = Vec::new();
        let mut init_bits = Vec::new();
        let mut lmap = self.lmap.clone();
        let wires = inputs.iter().zip(outputs).zip(latches);
        for (k, ((&input, &output), &latch)) in wires.enumerate() {
            let size = self
                .imap
                .size(input)
                .ok_or_else(|| eyre!("Unknown input '{}'", input))?;
            let output_size = self
                .omap
                .size(output)
                .ok_or_else(|| eyre!("Unknown output '{}'", output))?;
            ensure!(
                size == output_size,
                "Input '{}' has {} bits but output '{}' has {}",
                input,
                size,
                output,
                output_size
            );
            ensure!(
                lmap.insert(latch, size).is_none(),
                "Latch '{}' already exists",
                latch
            );
            let init = match initials {
                Some(initials) => initials[k].clone(),
                None => vec![false; size],
            };
            ensure!(
                init.len() == size,
                "Initial value of '{}' has {} bits, expected {}",
                latch,
                init.len(),
                size
            );
            for i in 0..size {
                input_bits.push(bit_name(input, i));
                output_bits.push(bit_name(output, i));
                latch_bits.push(bit_name(latch, i));
            }
            init_bits.extend(init);
        }

        fn as_strs(names: &[String]) -> Vec<&str> {
            names.iter().map(|s| s.as_str()).collect()
        }
        let latch_bits = as_strs(&latch_bits);
        let aig = self.aig.feedback(
            &as_strs(&input_bits),
            &as_strs(&output_bits),
            Some(init_bits.as_slice()),
            Some(latch_bits.as_slice()),
            keep_outputs,
        )?;
        let omap = if keep_outputs {
            self.omap.clone()
        } else {
            self.omap.omit(outputs)
        };
        Ok(AigBv {
            aig,
            imap: self.imap.omit(inputs),
            omap,
            lmap,
        })
    }

    /// Unrolls into a combinational circuit; word `x` at step `t` is named `x##time_t`.
    pub fn unroll(&self, horizon: usize, options: &UnrollOptions) -> eyre::Result<AigBv> {
        let mut aig = self.aig.unroll(horizon, options)?;
        for kind in [SymbolType::Input, SymbolType::Output, SymbolType::Latch] {
            let names: Vec<String> = match kind {
                SymbolType::Input => aig.inputs().map(|s| s.to_owned()).collect(),
                SymbolType::Output => aig.outputs().map(|s| s.to_owned()).collect(),
                SymbolType::Latch => aig.latches().map(|s| s.to_owned()).collect(),
            };
            let mapping = names
                .iter()
                .map(|name| {
                    let new = shuffle_id_time(name)
                        .ok_or_else(|| eyre!("Unexpected unrolled name '{}'", name))?;
                    Ok((name.clone(), new))
                })
                .collect::<eyre::Result<Vec<_>>>()?;
            aig = aig.relabel(kind, mapping)?;
        }
        Self::rebundle(aig)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        self.aig.write_to_file(path)
    }

    pub fn write_to_string(&self) -> eyre::Result<String> {
        self.aig.write_to_string()
    }
}

/// Moves the time stamp before the bit index: `x[i]##time_t` -> `x##time_t[i]`.
fn shuffle_id_time(name: &str) -> Option<String> {
    let (bit, time) = name.rsplit_once("##time_")?;
    if time.is_empty() || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (root, index) = unpack_name(bit)?;
    Some(bit_name(&format!("{}##time_{}", root, time), index))
}

impl Display for AigBv {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let words = |map: &BundleMap| {
            map.iter()
                .map(|(name, size)| format!("{}:{}", name, size))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "AigBv(inputs=[{}], latches=[{}], outputs=[{}], gates={})",
            words(&self.imap),
            words(&self.lmap),
            words(&self.omap),
            self.aig.num_gates()
        )
    }
}
