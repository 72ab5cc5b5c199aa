//! Audio fade wrapper: a transparent operator decorator for click-free
//! live topology changes.
//!
//! Wrapping rebinds the inner operator to private buffers: faded input
//! vertices are copied in through a per-sample gain ramp before the inner
//! execute, faded output vertices are copied out through the ramp after
//! it. Non-faded vertices pass straight through. The ramp spans exactly
//! one block and then holds — a fade-out keeps producing silence until
//! the wrapper is removed, which is what makes the subsequent
//! silence-literal replacement (or operator removal) discontinuity-free.
//!
//! The wrapper is installed and removed by transforms; the fence
//! mechanism guarantees it executes at least one full pass in between.

use resona_core::{
    AudioBuffer, Capabilities, InputVertexData, Operator, OutputVertexData, ReadRef, ResetParams,
    WriteRef,
};

/// Which way the wrapped vertices ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Ramp 0 → 1 over the first block, then pass through.
    FadeIn,
    /// Ramp 1 → 0 over the first block, then hold silence.
    FadeOut,
}

struct Tap {
    source: ReadRef<AudioBuffer>,
    dest: WriteRef<AudioBuffer>,
}

/// Decorator that fades a subset of an operator's audio vertices.
pub struct FadeWrapper {
    inner: Box<dyn Operator>,
    direction: FadeDirection,
    fade_inputs: Vec<String>,
    fade_outputs: Vec<String>,
    input_taps: Vec<Tap>,
    output_taps: Vec<Tap>,
    block_size: usize,
    ramp_done: bool,
}

impl FadeWrapper {
    /// Wraps `inner`, fading the named audio input/output vertices.
    pub fn new(
        inner: Box<dyn Operator>,
        direction: FadeDirection,
        fade_inputs: Vec<String>,
        fade_outputs: Vec<String>,
        block_size: usize,
    ) -> Self {
        Self {
            inner,
            direction,
            fade_inputs,
            fade_outputs,
            input_taps: Vec::new(),
            output_taps: Vec::new(),
            block_size,
            ramp_done: false,
        }
    }

    /// Unwraps, discarding the fade state.
    pub fn into_inner(self) -> Box<dyn Operator> {
        self.inner
    }

    /// Returns the fade direction.
    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    fn apply_gain(&self, source: &AudioBuffer, dest: &mut AudioBuffer) {
        let len = dest.len().min(source.len());
        if self.ramp_done {
            match self.direction {
                FadeDirection::FadeIn => {
                    dest.samples_mut()[..len].copy_from_slice(&source.samples()[..len]);
                }
                FadeDirection::FadeOut => dest.fill_silence(),
            }
            return;
        }
        if len == 0 {
            return;
        }
        let step = 1.0 / len as f32;
        for i in 0..len {
            let t = (i + 1) as f32 * step;
            let gain = match self.direction {
                FadeDirection::FadeIn => t,
                FadeDirection::FadeOut => 1.0 - t,
            };
            dest.samples_mut()[i] = source.samples()[i] * gain;
        }
    }
}

impl Operator for FadeWrapper {
    /// Substitutes private ramped buffers for the faded inputs and hands
    /// the inner operator the modified view; the true upstream bindings in
    /// `inputs` are left untouched.
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        self.input_taps.clear();
        let mut inner_view = inputs.clone();
        for name in &self.fade_inputs {
            if let Some(source) = inputs.get_read::<AudioBuffer>(name) {
                let dest = WriteRef::new(AudioBuffer::silent(self.block_size));
                if inner_view.bind(name, dest.as_read().into()).is_ok() {
                    self.input_taps.push(Tap { source, dest });
                }
            }
        }
        self.inner.bind_inputs(&mut inner_view);
    }

    /// Publishes the inner operator's outputs, substituting private ramped
    /// buffers for the faded ones. Downstream consumers see the wrapper's
    /// buffers for exactly as long as the wrapper is installed.
    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        self.output_taps.clear();
        let mut inner_view = outputs.clone();
        self.inner.bind_outputs(&mut inner_view);

        let names: Vec<String> = outputs
            .vertices()
            .iter()
            .map(|v| v.name().to_owned())
            .collect();
        for name in names {
            let Some(reference) = inner_view.reference(&name).cloned() else {
                continue;
            };
            if self.fade_outputs.contains(&name)
                && let Some(source) = reference.as_read::<AudioBuffer>()
            {
                let dest = WriteRef::new(AudioBuffer::silent(self.block_size));
                if outputs.bind(&name, dest.clone().into()).is_ok() {
                    self.output_taps.push(Tap { source, dest });
                    continue;
                }
            }
            if let Err(err) = outputs.bind(&name, reference) {
                tracing::warn!("fade wrapper could not republish output \"{name}\": {err}");
            }
        }
    }

    /// The wrapper always executes — it has a ramp to apply even when the
    /// inner operator declares no execute pass.
    fn capabilities(&self) -> Capabilities {
        let mut caps = self.inner.capabilities();
        caps.execute = true;
        caps
    }

    fn execute(&mut self) {
        for tap in &self.input_taps {
            let source = tap.source.read();
            let mut dest = tap.dest.write();
            self.apply_gain(&source, &mut dest);
        }
        if self.inner.capabilities().execute {
            self.inner.execute();
        }
        for tap in &self.output_taps {
            let source = tap.source.read();
            let mut dest = tap.dest.write();
            self.apply_gain(&source, &mut dest);
        }
        self.ramp_done = true;
    }

    fn post_execute(&mut self) {
        if self.inner.capabilities().post_execute {
            self.inner.post_execute();
        }
    }

    /// Reset is a discontinuity by definition; the ramp snaps to its
    /// target.
    fn reset(&mut self, params: &ResetParams<'_>) {
        self.ramp_done = true;
        if self.inner.capabilities().reset {
            self.inner.reset(params);
        }
    }
}
