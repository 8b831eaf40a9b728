use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter};

use eyre::{ensure, eyre};

use crate::node::{AigAndGate, AigLatch, Node};
use crate::reference::Ref;
use crate::toposort::{toposort_backward, toposort_forward};

/// Values of named bits.
pub type Valuation = BTreeMap<String, bool>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SymbolType {
    Input,
    Latch,
    Output,
}

/// Sequential And-Inverter Graph with named inputs, latches and outputs.
///
/// Node `0` is the constant `false`. Nodes are kept in topological order:
/// an AND gate only refers to nodes with smaller ids.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<Node>,
    inputs: BTreeMap<String, u32>,
    latches: BTreeMap<String, u32>,
    outputs: BTreeMap<String, Ref>,
    strash: HashMap<[Ref; 2], Ref>,
}

impl Default for Aig {
    fn default() -> Self {
        Self {
            nodes: vec![Node::Zero],
            inputs: BTreeMap::new(),
            latches: BTreeMap::new(),
            outputs: BTreeMap::new(),
            strash: HashMap::new(),
        }
    }
}

impl PartialEq for Aig {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.inputs == other.inputs
            && self.latches == other.latches
            && self.outputs == other.outputs
    }
}

impl Eq for Aig {}

impl Aig {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Adds an input, or returns the existing input with the same name.
    pub fn add_input(&mut self, name: impl Into<String>) -> Ref {
        let name = name.into();
        if let Some(&id) = self.inputs.get(&name) {
            return Ref::positive(id);
        }
        let id = self.next_id();
        self.nodes.push(Node::input(id));
        self.inputs.insert(name, id);
        Ref::positive(id)
    }

    /// Adds a latch with the given initial value.
    /// Its next state is `false` until set with [`Aig::set_latch_next`].
    pub fn add_latch(&mut self, name: impl Into<String>, init: bool) -> Ref {
        let name = name.into();
        assert!(
            !self.latches.contains_key(&name),
            "Duplicate latch '{}'",
            name
        );
        let id = self.next_id();
        self.nodes.push(Node::latch(id, Ref::FALSE, init));
        self.latches.insert(name, id);
        Ref::positive(id)
    }

    pub fn set_latch_next(&mut self, name: &str, next: Ref) {
        self.check_ref(next);
        let id = match self.latches.get(name) {
            Some(&id) => id,
            None => panic!("Latch '{}' does not exist", name),
        };
        if let Node::Latch(latch) = &mut self.nodes[id as usize] {
            latch.next = next;
        }
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Ref) {
        self.check_ref(output);
        let name = name.into();
        let old = self.outputs.insert(name, output);
        assert!(old.is_none(), "Duplicate output");
    }

    fn check_ref(&self, r: Ref) {
        assert!(
            (r.id() as usize) < self.nodes.len(),
            "Node {} does not exist",
            r.id()
        );
    }

    /// Creates (or reuses) an AND gate, folding constants and trivial cases.
    pub fn and(&mut self, left: Ref, right: Ref) -> Ref {
        self.check_ref(left);
        self.check_ref(right);
        if left == Ref::FALSE || right == Ref::FALSE || left == -right {
            return Ref::FALSE;
        }
        if left == Ref::TRUE || left == right {
            return right;
        }
        if right == Ref::TRUE {
            return left;
        }

        let args = if left <= right {
            [left, right]
        } else {
            [right, left]
        };
        if let Some(&r) = self.strash.get(&args) {
            return r;
        }
        let id = self.next_id();
        self.nodes.push(Node::and_gate(id, args));
        let r = Ref::positive(id);
        self.strash.insert(args, r);
        r
    }

    pub fn or(&mut self, left: Ref, right: Ref) -> Ref {
        -self.and(-left, -right)
    }

    pub fn xor(&mut self, left: Ref, right: Ref) -> Ref {
        let a = self.and(left, -right);
        let b = self.and(-left, right);
        self.or(a, b)
    }

    pub fn xnor(&mut self, left: Ref, right: Ref) -> Ref {
        -self.xor(left, right)
    }

    /// If-then-else: `cond ? then : other`.
    pub fn ite(&mut self, cond: Ref, then: Ref, other: Ref) -> Ref {
        let a = self.and(cond, then);
        let b = self.and(-cond, other);
        self.or(a, b)
    }

    pub fn and_all(&mut self, refs: impl IntoIterator<Item = Ref>) -> Ref {
        refs.into_iter().fold(Ref::TRUE, |acc, r| self.and(acc, r))
    }

    pub fn or_all(&mut self, refs: impl IntoIterator<Item = Ref>) -> Ref {
        refs.into_iter().fold(Ref::FALSE, |acc, r| self.or(acc, r))
    }

    pub fn xor_all(&mut self, refs: impl IntoIterator<Item = Ref>) -> Ref {
        refs.into_iter().fold(Ref::FALSE, |acc, r| self.xor(acc, r))
    }
}

impl Aig {
    /// Circuit with constant outputs.
    pub fn source<K: Into<String>>(values: impl IntoIterator<Item = (K, bool)>) -> Self {
        let mut aig = Aig::new();
        for (name, value) in values {
            aig.add_output(name, Ref::from_bool(value));
        }
        aig
    }

    /// Circuit with the given inputs and no outputs.
    pub fn sink<K: Into<String>>(names: impl IntoIterator<Item = K>) -> Self {
        let mut aig = Aig::new();
        for name in names {
            aig.add_input(name);
        }
        aig
    }

    /// Circuit forwarding each input to the output with the same name.
    pub fn identity<K: Into<String>>(names: impl IntoIterator<Item = K>) -> Self {
        let mut aig = Aig::new();
        for name in names {
            let name = name.into();
            let r = aig.add_input(name.clone());
            aig.add_output(name, r);
        }
        aig
    }
}

impl Aig {
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(|s| s.as_str())
    }
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|s| s.as_str())
    }
    pub fn latches(&self) -> impl Iterator<Item = &str> {
        self.latches.keys().map(|s| s.as_str())
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }
    pub fn num_latches(&self) -> usize {
        self.latches.len()
    }
    pub fn num_gates(&self) -> usize {
        self.and_gates().count()
    }

    pub fn input(&self, name: &str) -> Option<Ref> {
        self.inputs.get(name).map(|&id| Ref::positive(id))
    }
    pub fn output(&self, name: &str) -> Option<Ref> {
        self.outputs.get(name).copied()
    }
    pub fn latch(&self, name: &str) -> Option<AigLatch> {
        self.latches
            .get(name)
            .and_then(|&id| match self.nodes[id as usize] {
                Node::Latch(latch) => Some(latch),
                _ => None,
            })
    }

    pub fn latch2init(&self) -> Valuation {
        self.latches
            .keys()
            .filter_map(|name| Some((name.clone(), self.latch(name)?.init)))
            .collect()
    }

    /// Named inputs with their node ids.
    pub fn input_ids(&self) -> impl Iterator<Item = (&str, u32)> {
        self.inputs.iter().map(|(name, &id)| (name.as_str(), id))
    }
    /// Named latches with their node ids.
    pub fn latch_ids(&self) -> impl Iterator<Item = (&str, u32)> {
        self.latches.iter().map(|(name, &id)| (name.as_str(), id))
    }
    /// Named outputs with their literals.
    pub fn output_refs(&self) -> impl Iterator<Item = (&str, Ref)> {
        self.outputs.iter().map(|(name, &r)| (name.as_str(), r))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
    pub fn node(&self, id: u32) -> Node {
        self.nodes[id as usize]
    }
    pub fn and_gates(&self) -> impl Iterator<Item = &AigAndGate> {
        self.nodes.iter().filter_map(|node| match node {
            Node::AndGate(gate) => Some(gate),
            _ => None,
        })
    }
    pub fn gate(&self, id: u32) -> AigAndGate {
        match self.node(id) {
            Node::AndGate(gate) => gate,
            _ => panic!("Node with id {} is not an AND gate", id),
        }
    }

    /// The maximum variable index.
    pub fn max_id(&self) -> u32 {
        self.nodes.len() as u32 - 1
    }

    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.nodes.len()
    }
    pub fn is_input(&self, id: u32) -> bool {
        self.contains(id) && matches!(self.node(id), Node::Input(_))
    }
    pub fn is_latch(&self, id: u32) -> bool {
        self.contains(id) && matches!(self.node(id), Node::Latch(_))
    }
    pub fn is_gate(&self, id: u32) -> bool {
        self.contains(id) && matches!(self.node(id), Node::AndGate(_))
    }
}

impl Aig {
    /// Evaluates one step of the circuit.
    ///
    /// Returns the values of the outputs and the next values of the latches.
    /// Latches missing from `latches` (or all of them when `None`) start at their initial value.
    pub fn eval(
        &self,
        inputs: &Valuation,
        latches: Option<&Valuation>,
    ) -> eyre::Result<(Valuation, Valuation)> {
        let input_names: HashMap<u32, &str> = self
            .inputs
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();
        let latch_names: HashMap<u32, &str> = self
            .latches
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();

        let mut values: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            let value = match *node {
                Node::Zero => false,
                Node::Input(input) => {
                    let name = input_names[&input.id];
                    *inputs
                        .get(name)
                        .ok_or_else(|| eyre!("Missing value for input '{}'", name))?
                }
                Node::Latch(latch) => {
                    let name = latch_names[&latch.id];
                    latches
                        .and_then(|l| l.get(name).copied())
                        .unwrap_or(latch.init)
                }
                Node::AndGate(gate) => {
                    let [left, right] = gate.args;
                    left.apply(values[left.id() as usize])
                        && right.apply(values[right.id() as usize])
                }
            };
            values.push(value);
        }

        let value_of = |r: Ref| r.apply(values[r.id() as usize]);
        let outputs = self
            .outputs
            .iter()
            .map(|(name, &r)| (name.clone(), value_of(r)))
            .collect();
        let next_latches = self
            .latches
            .iter()
            .map(|(name, &id)| match self.nodes[id as usize] {
                Node::Latch(latch) => (name.clone(), value_of(latch.next)),
                _ => unreachable!("latch id {} refers to a non-latch node", id),
            })
            .collect();
        Ok((outputs, next_latches))
    }

    /// Runs the circuit over a sequence of input valuations, threading the latch state.
    pub fn simulate(
        &self,
        inputs: &[Valuation],
        latches: Option<&Valuation>,
    ) -> eyre::Result<Vec<(Valuation, Valuation)>> {
        let mut state = latches.cloned().unwrap_or_else(|| self.latch2init());
        let mut trace = Vec::with_capacity(inputs.len());
        for step in inputs {
            let (outputs, next) = self.eval(step, Some(&state))?;
            state = next.clone();
            trace.push((outputs, next));
        }
        Ok(trace)
    }
}

/// A leaf of a circuit being embedded into another one.
pub(crate) enum Leaf<'a> {
    Input(&'a str),
    Latch(&'a str, bool),
}

/// Result of [`Aig::embed`]: literals of the embedded outputs and latch next-states.
pub(crate) struct Embedding {
    pub outputs: BTreeMap<String, Ref>,
    pub latches: BTreeMap<String, Ref>,
}

impl Aig {
    /// Copies the gates of `other` into `self`, binding its leaves with `leaf`.
    pub(crate) fn embed(
        &mut self,
        other: &Aig,
        mut leaf: impl FnMut(&mut Aig, Leaf<'_>) -> Ref,
    ) -> Embedding {
        let input_names: HashMap<u32, &str> = other
            .inputs
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();
        let latch_names: HashMap<u32, &str> = other
            .latches
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();

        fn translate(mapping: &[Ref], r: Ref) -> Ref {
            let t = mapping[r.id() as usize];
            if r.is_negated() {
                -t
            } else {
                t
            }
        }

        let mut mapping: Vec<Ref> = Vec::with_capacity(other.nodes.len());
        for node in other.nodes.iter() {
            let r = match *node {
                Node::Zero => Ref::FALSE,
                Node::Input(input) => leaf(self, Leaf::Input(input_names[&input.id])),
                Node::Latch(latch) => leaf(self, Leaf::Latch(latch_names[&latch.id], latch.init)),
                Node::AndGate(gate) => {
                    let [left, right] = gate.args;
                    self.and(translate(&mapping, left), translate(&mapping, right))
                }
            };
            mapping.push(r);
        }

        let outputs = other
            .outputs
            .iter()
            .map(|(name, &r)| (name.clone(), translate(&mapping, r)))
            .collect();
        let latches = other
            .latches
            .iter()
            .filter_map(|(name, &id)| match other.nodes[id as usize] {
                Node::Latch(latch) => Some((name.clone(), translate(&mapping, latch.next))),
                _ => None,
            })
            .collect();
        Embedding { outputs, latches }
    }

    /// Embeds `other`, sharing inputs by name and copying its latches.
    fn embed_shared(&mut self, other: &Aig) -> BTreeMap<String, Ref> {
        let emb = self.embed(other, |aig, leaf| match leaf {
            Leaf::Input(name) => aig.add_input(name),
            Leaf::Latch(name, init) => aig.add_latch(name, init),
        });
        for (name, next) in emb.latches {
            self.set_latch_next(&name, next);
        }
        emb.outputs
    }

    /// Sequential composition: outputs of `self` feed the inputs of `other` with the same names.
    pub fn seq(&self, other: &Aig) -> eyre::Result<Aig> {
        let interface: HashSet<&str> = self
            .outputs()
            .filter(|o| other.inputs.contains_key(*o))
            .collect();
        if let Some(latch) = self.latches().find(|l| other.latches.contains_key(*l)) {
            eyre::bail!("Latch '{}' is present in both circuits", latch);
        }
        if let Some(output) = self
            .outputs()
            .filter(|o| !interface.contains(o))
            .find(|o| other.outputs.contains_key(*o))
        {
            eyre::bail!("Output '{}' is present in both circuits", output);
        }
        Ok(self.seq_unchecked(other))
    }

    pub(crate) fn seq_unchecked(&self, other: &Aig) -> Aig {
        log::trace!("Composing {} >> {}", self, other);
        let mut aig = Aig::new();
        let left = aig.embed_shared(self);

        let emb = aig.embed(other, |aig, leaf| match leaf {
            Leaf::Input(name) => match left.get(name) {
                Some(&r) => r,
                None => aig.add_input(name),
            },
            Leaf::Latch(name, init) => aig.add_latch(name, init),
        });
        for (name, next) in emb.latches {
            aig.set_latch_next(&name, next);
        }

        for (name, r) in left {
            if !other.inputs.contains_key(&name) {
                aig.add_output(name, r);
            }
        }
        for (name, r) in emb.outputs {
            aig.add_output(name, r);
        }
        aig
    }

    /// Parallel composition: inputs with the same names are shared.
    pub fn par(&self, other: &Aig) -> eyre::Result<Aig> {
        if let Some(output) = self.outputs().find(|o| other.outputs.contains_key(*o)) {
            eyre::bail!("Output '{}' is present in both circuits", output);
        }
        if let Some(latch) = self.latches().find(|l| other.latches.contains_key(*l)) {
            eyre::bail!("Latch '{}' is present in both circuits", latch);
        }
        Ok(self.par_unchecked(other))
    }

    pub(crate) fn par_unchecked(&self, other: &Aig) -> Aig {
        log::trace!("Composing {} | {}", self, other);
        let mut aig = Aig::new();
        let left = aig.embed_shared(self);
        let right = aig.embed_shared(other);
        for (name, r) in left.into_iter().chain(right) {
            aig.add_output(name, r);
        }
        aig
    }

    /// Renames inputs, outputs or latches.
    ///
    /// Names not present in the circuit are ignored.
    /// Fails if two names would end up the same.
    pub fn relabel<K, V>(
        &self,
        kind: SymbolType,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> eyre::Result<Aig>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mapping: HashMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.into()))
            .collect();
        let names: Vec<&str> = match kind {
            SymbolType::Input => self.inputs().collect(),
            SymbolType::Latch => self.latches().collect(),
            SymbolType::Output => self.outputs().collect(),
        };
        let mut renamed = HashSet::with_capacity(names.len());
        for name in names {
            let new = mapping.get(name).map_or(name, |s| s.as_str());
            ensure!(
                renamed.insert(new),
                "Relabeling {:?} '{}' clashes with another name '{}'",
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
    ) -> Aig {
        fn rename<T: Copy>(
            map: &BTreeMap<String, T>,
            mapping: &HashMap<String, String>,
        ) -> BTreeMap<String, T> {
            map.iter()
                .map(|(name, &v)| (mapping.get(name).unwrap_or(name).clone(), v))
                .collect()
        }

        let mut aig = self.clone();
        match kind {
            SymbolType::Input => aig.inputs = rename(&self.inputs, mapping),
            SymbolType::Latch => aig.latches = rename(&self.latches, mapping),
            SymbolType::Output => aig.outputs = rename(&self.outputs, mapping),
        }
        aig
    }

    /// Drops the given outputs.
    pub fn omit_outputs<K: AsRef<str>>(&self, names: impl IntoIterator<Item = K>) -> Aig {
        let mut aig = self.clone();
        for name in names {
            aig.outputs.remove(name.as_ref());
        }
        aig
    }

    /// Closes loops: each `inputs[k]` gets driven by a new latch `latches[k]`
    /// whose next state is `outputs[k]`.
    ///
    /// Latch names default to the input names, initial values default to `false`.
    /// Unless `keep_outputs`, the fed-back outputs are removed.
    pub fn feedback(
        &self,
        inputs: &[&str],
        outputs: &[&str],
        initials: Option<&[bool]>,
        latches: Option<&[&str]>,
        keep_outputs: bool,
    ) -> eyre::Result<Aig> {
        let latches = latches.unwrap_or(inputs);
        ensure!(
            inputs.len() == outputs.len(),
            "Feedback needs as many outputs ({}) as inputs ({})",
            outputs.len(),
            inputs.len()
        );
        ensure!(
            latches.len() == inputs.len(),
            "Feedback needs as many latches ({}) as inputs ({})",
            latches.len(),
            inputs.len()
        );
        if let Some(initials) = initials {
            ensure!(
                initials.len() == inputs.len(),
                "Feedback needs as many initial values ({}) as inputs ({})",
                initials.len(),
                inputs.len()
            );
        }
        for name in inputs {
            ensure!(self.inputs.contains_key(*name), "Unknown input '{}'", name);
        }
        for name in outputs {
            ensure!(self.outputs.contains_key(*name), "Unknown output '{}'", name);
        }
        let mut seen = HashSet::new();
        for name in latches {
            ensure!(
                !self.latches.contains_key(*name) && seen.insert(*name),
                "Latch '{}' already exists",
                name
            );
        }
        let mut seen = HashSet::new();
        for name in inputs {
            ensure!(seen.insert(*name), "Input '{}' is fed back twice", name);
        }

        log::debug!("Feeding back {:?} into {:?}", outputs, inputs);
        let mut aig = Aig::new();
        let mut drivers: HashMap<&str, Ref> = HashMap::new();
        for (k, (&input, &latch)) in inputs.iter().zip(latches).enumerate() {
            let init = initials.map_or(false, |values| values[k]);
            drivers.insert(input, aig.add_latch(latch, init));
        }

        let emb = aig.embed(self, |aig, leaf| match leaf {
            Leaf::Input(name) => match drivers.get(name) {
                Some(&r) => r,
                None => aig.add_input(name),
            },
            Leaf::Latch(name, init) => aig.add_latch(name, init),
        });
        for (name, next) in emb.latches {
            aig.set_latch_next(&name, next);
        }
        for (&latch, &output) in latches.iter().zip(outputs) {
            aig.set_latch_next(latch, emb.outputs[output]);
        }
        let fed: HashSet<&str> = outputs.iter().copied().collect();
        for (name, r) in emb.outputs {
            if keep_outputs || !fed.contains(name.as_str()) {
                aig.add_output(name, r);
            }
        }
        Ok(aig)
    }

    /// Unrolls the circuit `horizon` times into a combinational circuit.
    ///
    /// Input `x` at step `t` is named `x##time_t`, output `y` computed at step `t`
    /// is `y##time_{t+1}`.
    pub fn unroll(&self, horizon: usize, options: &UnrollOptions) -> eyre::Result<Aig> {
        if !options.omit_latches {
            if let Some(name) = self.latches().find(|l| self.outputs.contains_key(*l)) {
                eyre::bail!("Latch '{}' clashes with an output of the same name", name);
            }
        }
        if !options.init {
            if let Some(name) = self.latches().find(|l| self.inputs.contains_key(*l)) {
                eyre::bail!("Latch '{}' clashes with an input of the same name", name);
            }
        }
        log::debug!("Unrolling {} for {} steps", self, horizon);

        let mut aig = Aig::new();
        let mut state: BTreeMap<String, Ref> = BTreeMap::new();
        for (name, &id) in self.latches.iter() {
            let r = if options.init {
                let init = matches!(self.nodes[id as usize], Node::Latch(latch) if latch.init);
                Ref::from_bool(init)
            } else {
                aig.add_input(timed(name, 0))
            };
            state.insert(name.clone(), r);
        }

        for t in 0..horizon {
            let emb = aig.embed(self, |aig, leaf| match leaf {
                Leaf::Input(name) => aig.add_input(timed(name, t)),
                Leaf::Latch(name, _) => state[name],
            });
            let keep = !options.only_last_outputs || t + 1 == horizon;
            if keep {
                for (name, &r) in emb.outputs.iter() {
                    aig.add_output(timed(name, t + 1), r);
                }
                if !options.omit_latches {
                    for (name, &r) in emb.latches.iter() {
                        aig.add_output(timed(name, t + 1), r);
                    }
                }
            }
            state = emb.latches;
        }
        Ok(aig)
    }

    /// Copy of the circuit without the gates that no output or latch depends on.
    pub fn compacted(&self) -> Aig {
        let mut used = vec![false; self.nodes.len()];
        let mut stack: Vec<u32> = self.outputs.values().map(|r| r.id()).collect();
        stack.extend(self.latches.values().copied());
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut used[id as usize], true) {
                continue;
            }
            match self.nodes[id as usize] {
                Node::Latch(latch) => stack.push(latch.next.id()),
                node => stack.extend(node.children().iter().map(|c| c.id())),
            }
        }

        let mut aig = Aig::new();
        let emb = aig.embed(&self.prune(&used), |aig, leaf| match leaf {
            Leaf::Input(name) => aig.add_input(name),
            Leaf::Latch(name, init) => aig.add_latch(name, init),
        });
        for (name, next) in emb.latches {
            aig.set_latch_next(&name, next);
        }
        for (name, r) in emb.outputs {
            aig.add_output(name, r);
        }
        aig
    }

    /// Replaces unused AND gates by the constant so that embedding skips them.
    fn prune(&self, used: &[bool]) -> Aig {
        let mut aig = self.clone();
        for (id, node) in aig.nodes.iter_mut().enumerate() {
            if matches!(node, Node::AndGate(_)) && !used[id] {
                *node = Node::and_gate(id as u32, [Ref::FALSE, Ref::FALSE]);
            }
        }
        aig
    }
}

pub(crate) fn timed(name: &str, t: usize) -> String {
    format!("{}##time_{}", name, t)
}

/// Options for [`Aig::unroll`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UnrollOptions {
    /// Start latches at their initial values. Otherwise latch `l` becomes the input `l##time_0`.
    pub init: bool,
    /// Do not expose latch values as outputs.
    pub omit_latches: bool,
    /// Keep only the outputs of the last step.
    pub only_last_outputs: bool,
}

impl Default for UnrollOptions {
    fn default() -> Self {
        Self {
            init: true,
            omit_latches: true,
            only_last_outputs: false,
        }
    }
}

impl Aig {
    /// Layers of nodes, starting from the leaves (inputs, latches and the constant).
    pub fn layers_input(&self) -> impl Iterator<Item = Vec<u32>> {
        toposort_backward(&self.dependency_graph()).map(|mut xs| {
            xs.sort();
            xs
        })
    }

    /// Layers of nodes, starting from the nodes nothing depends on.
    pub fn layers_output(&self) -> impl Iterator<Item = Vec<u32>> {
        toposort_forward(&self.dependency_graph()).map(|mut xs| {
            xs.sort();
            xs
        })
    }

    fn dependency_graph(&self) -> HashMap<u32, Vec<u32>> {
        self.nodes
            .iter()
            .map(|node| {
                let children: BTreeSet<u32> = node.children().iter().map(|c| c.id()).collect();
                (node.id(), children.into_iter().collect())
            })
            .collect()
    }
}

impl Display for Aig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Aig(inputs={}, latches={}, outputs={}, gates={})",
            self.num_inputs(),
            self.num_latches(),
            self.num_outputs(),
            self.num_gates()
        )
    }
}
