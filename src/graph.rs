//! The dataflow graph that wires sections together.
//!
//! A graph is built once: sections are added, their named output sockets connected to
//! named input sockets, and the evaluation order is fixed by a topological sort at build
//! time. Rendering then runs every section once per block in that order, copying each
//! upstream output buffer into the sockets it feeds.

use alloc::{boxed::Box, format, string::String, vec, vec::Vec};

use crate::error::{SynthesisError, SynthesisResult};
use crate::params::SynthesisParameters;
use crate::sections::{Block, Section};

/// Index of a section inside a [`GraphBuilder`].
pub type NodeId = usize;

struct Node<'a> {
    section: Box<dyn Section + 'a>,
    /// upstream `(node, output socket)` feeding each input socket
    sources: Vec<Option<(NodeId, usize)>>,
    inputs: Vec<Vec<f64>>,
    outputs: Vec<Vec<f64>>,
}

/// Collects sections and connections before the evaluation order is fixed.
#[derive(Default)]
pub struct GraphBuilder<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        GraphBuilder { nodes: Vec::new() }
    }

    pub fn add(&mut self, section: impl Section + 'a) -> NodeId {
        let sources = vec![None; section.inputs().len()];
        self.nodes.push(Node {
            section: Box::new(section),
            sources,
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Feeds output socket `output` of `from` into input socket `input` of `to`.
    ///
    /// An output may feed any number of inputs; an input accepts exactly one connection.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidGraph`] for unknown nodes or sockets, self-loops and
    /// inputs that are already connected.
    pub fn connect(&mut self, from: NodeId, output: &str, to: NodeId, input: &str) -> SynthesisResult<()> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(SynthesisError::InvalidGraph(String::from("unknown node")));
        }
        if from == to {
            return Err(SynthesisError::InvalidGraph(format!(
                "{} cannot feed itself",
                self.nodes[from].section.name()
            )));
        }
        let out_idx = socket_index(self.nodes[from].section.outputs(), output).ok_or_else(|| {
            SynthesisError::InvalidGraph(format!(
                "{} has no output {output}",
                self.nodes[from].section.name()
            ))
        })?;
        let dest = &mut self.nodes[to];
        let in_idx = socket_index(dest.section.inputs(), input).ok_or_else(|| {
            SynthesisError::InvalidGraph(format!("{} has no input {input}", dest.section.name()))
        })?;
        if dest.sources[in_idx].is_some() {
            return Err(SynthesisError::InvalidGraph(format!(
                "input {input} of {} is already connected",
                dest.section.name()
            )));
        }
        dest.sources[in_idx] = Some((from, out_idx));
        Ok(())
    }

    /// Fixes the evaluation order and allocates one buffer of `block_len` samples per socket.
    ///
    /// Among sections that are ready at the same time, the one added first runs first.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidGraph`] if an input is left unconnected or the connections
    /// form a cycle, [`SynthesisError::InvalidChunkLength`] for a zero block length.
    pub fn build(self, block_len: usize) -> SynthesisResult<SynthesisGraph<'a>> {
        if block_len == 0 {
            return Err(SynthesisError::InvalidChunkLength);
        }
        for node in &self.nodes {
            if let Some(socket) = node.sources.iter().position(Option::is_none) {
                return Err(SynthesisError::InvalidGraph(format!(
                    "input {} of {} is not connected",
                    node.section.inputs()[socket],
                    node.section.name()
                )));
            }
        }

        let order = topological_order(&self.nodes)?;
        let mut new_index = vec![0; self.nodes.len()];
        for (pos, &old) in order.iter().enumerate() {
            new_index[old] = pos;
        }
        let mut slots: Vec<Option<Node<'a>>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(slots.len());
        for old in order {
            let Some(mut node) = slots[old].take() else {
                return Err(SynthesisError::InvalidGraph(String::from("node visited twice")));
            };
            for (src, _) in node.sources.iter_mut().flatten() {
                *src = new_index[*src];
            }
            node.inputs = vec![vec![0.0; block_len]; node.section.inputs().len()];
            node.outputs = vec![vec![0.0; block_len]; node.section.outputs().len()];
            nodes.push(node);
        }

        let graph = SynthesisGraph {
            nodes,
            block_len,
            shape: None,
        };
        tracing::debug!(order = ?graph.order(), block_len, "built synthesis graph");
        Ok(graph)
    }
}

fn socket_index(sockets: &[&str], name: &str) -> Option<usize> {
    sockets.iter().position(|s| *s == name)
}

/// Kahn's algorithm, always picking the lowest-index ready node.
fn topological_order(nodes: &[Node<'_>]) -> SynthesisResult<Vec<NodeId>> {
    let mut pending: Vec<usize> = nodes.iter().map(|n| n.sources.len()).collect();
    let mut done = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    while order.len() < nodes.len() {
        let Some(next) = (0..nodes.len()).find(|&i| !done[i] && pending[i] == 0) else {
            return Err(SynthesisError::InvalidGraph(String::from(
                "connections form a cycle",
            )));
        };
        done[next] = true;
        order.push(next);
        for (i, node) in nodes.iter().enumerate() {
            pending[i] -= node
                .sources
                .iter()
                .flatten()
                .filter(|(src, _)| *src == next)
                .count();
        }
    }
    Ok(order)
}

/// What the sections of a standard graph were sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    sample_rate: usize,
    formant_count: usize,
}

impl Shape {
    fn of(params: &SynthesisParameters) -> Self {
        Shape {
            sample_rate: params.sample_rate,
            formant_count: params.formant_count,
        }
    }
}

/// A built, immutable wiring of sections, ready to render.
pub struct SynthesisGraph<'a> {
    /// sorted in evaluation order
    nodes: Vec<Node<'a>>,
    block_len: usize,
    shape: Option<Shape>,
}

impl SynthesisGraph<'_> {
    /// Ties the graph to the shape of `params`, which [`SynthesisGraph::render`] then checks.
    pub(crate) fn built_for(mut self, params: &SynthesisParameters) -> Self {
        self.shape = Some(Shape::of(params));
        self
    }

    /// Section names in evaluation order.
    #[must_use]
    pub fn order(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|n| n.section.name()).collect()
    }

    #[must_use]
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Renders all `params.n_samp` samples block by block and returns the waveform
    /// produced by the output section.
    ///
    /// Every section is reset first, so rendering the same parameters twice gives the
    /// same waveform.
    ///
    /// # Errors
    ///
    /// Whatever a section reports, and [`SynthesisError::InvalidGraph`] if no section
    /// produces a waveform or the graph was built for parameters of another shape.
    pub fn render(&mut self, params: &SynthesisParameters) -> SynthesisResult<Vec<f64>> {
        if let Some(shape) = self.shape {
            let given = Shape::of(params);
            if given != shape {
                return Err(SynthesisError::InvalidGraph(format!(
                    "graph was built for {} formants at {} Hz, parameters have {} formants at {} Hz",
                    shape.formant_count, shape.sample_rate, given.formant_count, given.sample_rate
                )));
            }
        }
        for node in &mut self.nodes {
            node.section.reset();
        }

        let mut start = 0;
        while start < params.n_samp {
            let len = self.block_len.min(params.n_samp - start);
            let block = Block { params, start, len };
            tracing::trace!(start, len, "rendering block");
            self.run_block(&block)?;
            start += len;
        }

        let mut waveform = None;
        for node in &mut self.nodes {
            if let Some(w) = node.section.finish()? {
                waveform = Some(w);
            }
        }
        waveform.ok_or_else(|| SynthesisError::InvalidGraph(String::from("no section produced a waveform")))
    }

    fn run_block(&mut self, block: &Block<'_>) -> SynthesisResult<()> {
        let len = block.len;
        for i in 0..self.nodes.len() {
            let (done, rest) = self.nodes.split_at_mut(i);
            let node = &mut rest[0];
            for (socket, source) in node.sources.iter().enumerate() {
                if let Some((src, out)) = *source {
                    node.inputs[socket][..len].copy_from_slice(&done[src].outputs[out][..len]);
                }
            }
            node.section.run(block, &node.inputs, &mut node.outputs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ControlTracks, Settings};

    /// Emits the absolute sample index.
    struct Ramp;
    impl Section for Ramp {
        fn name(&self) -> &'static str {
            "ramp"
        }
        fn inputs(&self) -> &'static [&'static str] {
            &[]
        }
        fn outputs(&self) -> &'static [&'static str] {
            &["out"]
        }
        fn reset(&mut self) {}
        fn run(&mut self, block: &Block<'_>, _: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
            for (i, y) in outputs[0][..block.len].iter_mut().enumerate() {
                *y = (block.start + i) as f64;
            }
            Ok(())
        }
    }

    /// Adds its two inputs.
    struct Add;
    impl Section for Add {
        fn name(&self) -> &'static str {
            "add"
        }
        fn inputs(&self) -> &'static [&'static str] {
            &["a", "b"]
        }
        fn outputs(&self) -> &'static [&'static str] {
            &["sum"]
        }
        fn reset(&mut self) {}
        fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
            for i in 0..block.len {
                outputs[0][i] = inputs[0][i] + inputs[1][i];
            }
            Ok(())
        }
    }

    /// Collects its input.
    struct Sink(Vec<f64>);
    impl Section for Sink {
        fn name(&self) -> &'static str {
            "sink"
        }
        fn inputs(&self) -> &'static [&'static str] {
            &["in"]
        }
        fn outputs(&self) -> &'static [&'static str] {
            &[]
        }
        fn reset(&mut self) {
            self.0.clear();
        }
        fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], _: &mut [Vec<f64>]) -> SynthesisResult<()> {
            self.0.extend_from_slice(&inputs[0][..block.len]);
            Ok(())
        }
        fn finish(&mut self) -> SynthesisResult<Option<Vec<f64>>> {
            Ok(Some(core::mem::take(&mut self.0)))
        }
    }

    fn params(duration: f64) -> SynthesisParameters {
        let settings = Settings {
            duration,
            ..Settings::default()
        };
        SynthesisParameters::new(&ControlTracks::default(), &settings).unwrap()
    }

    #[test]
    fn order_follows_connections_not_insertion() {
        let mut g = GraphBuilder::new();
        let sink = g.add(Sink(Vec::new()));
        let add = g.add(Add);
        let ramp = g.add(Ramp);
        g.connect(ramp, "out", add, "a").unwrap();
        g.connect(ramp, "out", add, "b").unwrap();
        g.connect(add, "sum", sink, "in").unwrap();
        let graph = g.build(4).unwrap();
        assert_eq!(graph.order(), vec!["ramp", "add", "sink"]);
    }

    #[test]
    fn renders_in_blocks() {
        let mut g = GraphBuilder::new();
        let ramp = g.add(Ramp);
        let add = g.add(Add);
        let sink = g.add(Sink(Vec::new()));
        g.connect(ramp, "out", add, "a").unwrap();
        g.connect(ramp, "out", add, "b").unwrap();
        g.connect(add, "sum", sink, "in").unwrap();
        let p = params(0.001);
        let out = g.build(3).unwrap().render(&p).unwrap();
        let expected: Vec<f64> = (0..10).map(|i| 2.0 * f64::from(i)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn renders_again_from_the_start() {
        let mut g = GraphBuilder::new();
        let ramp = g.add(Ramp);
        let sink = g.add(Sink(vec![-1.0; 3]));
        g.connect(ramp, "out", sink, "in").unwrap();
        let mut graph = g.build(4).unwrap();
        let p = params(0.001);
        let first = graph.render(&p).unwrap();
        assert_eq!(first, (0..10).map(f64::from).collect::<Vec<_>>());
        assert_eq!(graph.render(&p).unwrap(), first);
    }

    #[test]
    fn rejects_unconnected_input() {
        let mut g = GraphBuilder::new();
        let ramp = g.add(Ramp);
        let add = g.add(Add);
        g.connect(ramp, "out", add, "a").unwrap();
        assert!(matches!(g.build(8), Err(SynthesisError::InvalidGraph(_))));
    }

    #[test]
    fn rejects_cycles() {
        let mut g = GraphBuilder::new();
        let a = g.add(Add);
        let b = g.add(Add);
        let ramp = g.add(Ramp);
        g.connect(ramp, "out", a, "a").unwrap();
        g.connect(b, "sum", a, "b").unwrap();
        g.connect(ramp, "out", b, "a").unwrap();
        g.connect(a, "sum", b, "b").unwrap();
        let err = g.build(8).err().unwrap();
        assert_eq!(err, SynthesisError::InvalidGraph("connections form a cycle".into()));
    }

    #[test]
    fn rejects_bad_sockets() {
        let mut g = GraphBuilder::new();
        let ramp = g.add(Ramp);
        let add = g.add(Add);
        assert!(g.connect(ramp, "nope", add, "a").is_err());
        assert!(g.connect(ramp, "out", add, "c").is_err());
        assert!(g.connect(add, "sum", add, "a").is_err());
        g.connect(ramp, "out", add, "a").unwrap();
        assert!(g.connect(ramp, "out", add, "a").is_err());
    }
}
