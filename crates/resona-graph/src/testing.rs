//! Shared test nodes for the engine's unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use resona_core::{
    AudioBuffer, Capabilities, InputVertex, InputVertexData, Literal, Operator, OutputVertex,
    OutputVertexData, ReadRef, ResetParams, VertexInterface, WriteRef,
};

use crate::node::{CreateOperatorParams, Node, OperatorError};

/// Constant audio source with a float level readout.
pub struct SourceNode {
    interface: VertexInterface,
    value: f32,
}

impl SourceNode {
    pub fn new() -> Self {
        Self::with_value(1.0)
    }

    pub fn with_value(value: f32) -> Self {
        Self {
            interface: VertexInterface::new(
                vec![],
                vec![
                    OutputVertex::new::<AudioBuffer>("Out"),
                    OutputVertex::new::<f32>("Level"),
                ],
            ),
            value,
        }
    }
}

impl Node for SourceNode {
    fn vertex_interface(&self) -> &VertexInterface {
        &self.interface
    }

    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        Ok(Box::new(SourceOperator {
            value: self.value,
            out: WriteRef::new(AudioBuffer::silent(params.settings.block_size())),
            level: WriteRef::new(self.value),
        }))
    }
}

struct SourceOperator {
    value: f32,
    out: WriteRef<AudioBuffer>,
    level: WriteRef<f32>,
}

impl Operator for SourceOperator {
    fn bind_inputs(&mut self, _inputs: &mut InputVertexData) {}

    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        outputs.bind_write("Out", &self.out).unwrap();
        outputs.bind_write("Level", &self.level).unwrap();
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::EXECUTE
    }

    fn execute(&mut self) {
        self.out.write().samples_mut().fill(self.value);
        *self.level.write() = self.value;
    }
}

/// Audio passthrough with a gain input.
pub struct PassNode {
    interface: VertexInterface,
}

impl PassNode {
    pub fn new() -> Self {
        Self {
            interface: VertexInterface::new(
                vec![
                    InputVertex::new::<AudioBuffer>("In", Literal::None),
                    InputVertex::new::<f32>("Gain", 1.0),
                ],
                vec![OutputVertex::new::<AudioBuffer>("Out")],
            ),
        }
    }
}

impl Node for PassNode {
    fn vertex_interface(&self) -> &VertexInterface {
        &self.interface
    }

    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        let input = params.inputs.get_or_default::<AudioBuffer>("In", params.settings)?;
        let gain = params.inputs.get_or_default::<f32>("Gain", params.settings)?;
        Ok(Box::new(PassOperator {
            input,
            gain,
            out: WriteRef::new(AudioBuffer::silent(params.settings.block_size())),
        }))
    }
}

struct PassOperator {
    input: ReadRef<AudioBuffer>,
    gain: ReadRef<f32>,
    out: WriteRef<AudioBuffer>,
}

impl Operator for PassOperator {
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

/// Which pass a [`TraceNode`] operator recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePass {
    Execute,
    PostExecute,
    Reset,
}

/// Shared log of `(tag, pass)` entries in call order.
pub type TraceLog = Arc<Mutex<Vec<(u64, TracePass)>>>;

/// Creates an empty trace log.
pub fn trace_log() -> TraceLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Drains the log into a plain vector.
pub fn take_trace(log: &TraceLog) -> Vec<(u64, TracePass)> {
    std::mem::take(&mut *log.lock().unwrap_or_else(PoisonError::into_inner))
}

/// Float passthrough that records every pass it runs into a shared log.
pub struct TraceNode {
    interface: VertexInterface,
    tag: u64,
    log: TraceLog,
}

impl TraceNode {
    pub fn new(tag: u64, log: TraceLog) -> Self {
        Self {
            interface: VertexInterface::new(
                vec![InputVertex::new::<f32>("In", 0.0)],
                vec![OutputVertex::new::<f32>("Out")],
            ),
            tag,
            log,
        }
    }
}

impl Node for TraceNode {
    fn vertex_interface(&self) -> &VertexInterface {
        &self.interface
    }

    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError> {
        let input = params.inputs.get_or_default::<f32>("In", params.settings)?;
        Ok(Box::new(TraceOperator {
            tag: self.tag,
            log: Arc::clone(&self.log),
            input,
            out: WriteRef::new(0.0),
        }))
    }
}

struct TraceOperator {
    tag: u64,
    log: TraceLog,
    input: ReadRef<f32>,
    out: WriteRef<f32>,
}

impl TraceOperator {
    fn record(&self, pass: TracePass) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.tag, pass));
    }
}

impl Operator for TraceOperator {
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        if let Some(input) = inputs.get_read::<f32>("In") {
            self.input = input;
        }
    }

    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        outputs.bind_write("Out", &self.out).unwrap();
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn execute(&mut self) {
        *self.out.write() = *self.input.read();
        self.record(TracePass::Execute);
    }

    fn post_execute(&mut self) {
        self.record(TracePass::PostExecute);
    }

    fn reset(&mut self, _params: &ResetParams<'_>) {
        self.record(TracePass::Reset);
    }
}
