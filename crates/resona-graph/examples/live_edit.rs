//! Demonstration of live graph editing in Resona
//!
//! Builds a two-node graph (sine oscillator → gain), starts a render
//! loop, then splices a second gain stage in between while rendering
//! continues — the edit drains at the top of a cycle, never mid-pass,
//! and the incremental sorter repairs execution order locally.
//!
//! Run with: cargo run --example live_edit

use std::collections::HashMap;
use std::sync::Arc;

use resona_core::{
    AudioBuffer, Capabilities, DataTypeRegistry, Environment, InputVertex, InputVertexData,
    Literal, Operator, OperatorSettings, OutputVertex, OutputVertexData, ReadRef, VertexInterface,
    WriteRef,
};
use resona_graph::{
    BuildParams, BuilderSettings, CreateOperatorParams, Graph, Node, NodeId, OperatorBuilder,
    OperatorError, Transactor,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK_SIZE: usize = 64;

/// Fixed-frequency sine oscillator node.
struct SineNode {
    interface: VertexInterface,
}

impl SineNode {
    fn new() -> Self {
        Self {
            interface: VertexInterface::new(
                vec![InputVertex::new::<f32>("Freq", 440.0f32)],
                vec![OutputVertex::new::<AudioBuffer>("Out")],
            ),
        }
    }
}

impl Node for SineNode {
    fn vertex_interface(&self) -> &VertexInterface {
        &self.interface
    }

    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        let freq = params.inputs.get_or_default::<f32>("Freq", params.settings)?;
        Ok(Box::new(SineOperator {
            freq,
            phase: 0.0,
            sample_rate: params.settings.sample_rate(),
            out: WriteRef::new(AudioBuffer::silent(params.settings.block_size())),
        }))
    }
}

struct SineOperator {
    freq: ReadRef<f32>,
    phase: f32,
    sample_rate: f32,
    out: WriteRef<AudioBuffer>,
}

impl Operator for SineOperator {
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        if let Some(freq) = inputs.get_read::<f32>("Freq") {
            self.freq = freq;
        }
    }

    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        outputs.bind_write("Out", &self.out).unwrap();
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::EXECUTE
    }

    fn execute(&mut self) {
        let step = *self.freq.read() / self.sample_rate;
        let mut out = self.out.write();
        for sample in out.samples_mut() {
            *sample = (self.phase * std::f32::consts::TAU).sin();
            self.phase = (self.phase + step).fract();
        }
    }
}

/// Gain stage node.
struct GainNode {
    interface: VertexInterface,
}

impl GainNode {
    fn new(default_gain: f32) -> Self {
        Self {
            interface: VertexInterface::new(
                vec![
                    InputVertex::new::<AudioBuffer>("In", Literal::None),
                    InputVertex::new::<f32>("Gain", default_gain),
                ],
                vec![OutputVertex::new::<AudioBuffer>("Out")],
            ),
        }
    }
}

impl Node for GainNode {
    fn vertex_interface(&self) -> &VertexInterface {
        &self.interface
    }

    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        let input = params
            .inputs
            .get_or_default::<AudioBuffer>("In", params.settings)?;
        let gain = params.inputs.get_or_default::<f32>("Gain", params.settings)?;
        Ok(Box::new(GainOperator {
            input,
            gain,
            out: WriteRef::new(AudioBuffer::silent(params.settings.block_size())),
        }))
    }
}

struct GainOperator {
    input: ReadRef<AudioBuffer>,
    gain: ReadRef<f32>,
    out: WriteRef<AudioBuffer>,
}

impl Operator for GainOperator {
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        if let Some(input) = inputs.get_read::<AudioBuffer>("In") {
            self.input = input;
        }
        if let Some(gain) = inputs.get_read::<f32>("Gain") {
            self.gain = gain;
        }
    }

    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        outputs.bind_write("Out", &self.out).unwrap();
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::EXECUTE
    }

    fn execute(&mut self) {
        let gain = *self.gain.read();
        let input = self.input.read();
        let mut out = self.out.write();
        let len = out.len().min(input.len());
        for i in 0..len {
            out.samples_mut()[i] = input.samples()[i] * gain;
        }
    }
}

fn peak(buffer: &AudioBuffer) -> f32 {
    buffer.samples().iter().fold(0.0, |m, s| m.max(s.abs()))
}

fn main() {
    println!("Resona Live Edit Demo");
    println!("=====================\n");

    let registry = Arc::new(DataTypeRegistry::with_core_types());

    let osc = NodeId(1);
    let master = NodeId(2);
    let mut graph = Graph::new();
    graph.add_node(osc, Arc::new(SineNode::new())).unwrap();
    graph.add_node(master, Arc::new(GainNode::new(0.8))).unwrap();
    graph.add_data_edge(osc, "Out", master, "In").unwrap();
    graph.add_output_data_source(master, "Out").unwrap();

    let mut transactor = Transactor::with_graph(graph, Arc::clone(&registry)).unwrap();
    let builder = OperatorBuilder::new(BuilderSettings::default(), registry);
    let params = BuildParams {
        settings: OperatorSettings::new(SAMPLE_RATE, BLOCK_SIZE),
        environment: Environment::new(),
        graph_inputs: HashMap::new(),
    };
    let mut runtime = transactor.create_runtime(&builder, params).unwrap().operator;
    let output = runtime.graph_output_reference("Out").unwrap();
    let output = output.as_read::<AudioBuffer>().unwrap();

    println!("1. Steady state: oscillator → master gain");
    for _ in 0..4 {
        runtime.run_cycle();
    }
    println!("   execute order: {:?}", runtime.execute_order());
    println!("   output peak:   {:.3}\n", peak(&output.read()));

    // Splice an attenuator between the oscillator and the master while
    // the render loop keeps running. The audio connections fade in/out
    // across a cycle each, so the rewire is click-free.
    println!("2. Splicing an attenuator into the live graph");
    let trim = NodeId(3);
    transactor
        .remove_data_edge(osc, "Out", master, "In", Literal::None)
        .unwrap();
    transactor.add_node(trim, Arc::new(GainNode::new(0.5))).unwrap();
    transactor.add_data_edge(osc, "Out", trim, "In").unwrap();
    transactor.add_data_edge(trim, "Out", master, "In").unwrap();

    for cycle in 0..6 {
        runtime.run_cycle();
        println!(
            "   cycle {cycle}: peak {:.3}{}",
            peak(&output.read()),
            if runtime.is_fading(master) { "  (fading)" } else { "" },
        );
    }
    println!("   execute order: {:?}", runtime.execute_order());
    println!("   render cost:   {:.1}\n", runtime.render_cost());

    println!("3. Tweaking the attenuator from the edit thread");
    transactor.set_value(trim, "Gain", 0.25f32).unwrap();
    for _ in 0..2 {
        runtime.run_cycle();
    }
    println!("   output peak:   {:.3}", peak(&output.read()));
}
