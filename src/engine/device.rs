//! Audio device backend (cpal)
//!
//! Renders the graph from the output device's callback thread. The graph is
//! shared with the engine behind a mutex; the engine only holds the lock
//! while scheduling, never while waiting.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig};

use crate::engine::context::{AudioBackend, AudioContext, ContextState};
use crate::engine::graph::RenderGraph;
use crate::error::{BinauralError, Result};

/// Backend opening the host's default output device
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceBackend;

impl DeviceBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for DeviceBackend {
    type Context = DeviceContext;

    fn open(&mut self) -> Result<DeviceContext> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(BinauralError::NoOutputDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| BinauralError::AudioUnavailable {
                reason: format!("failed to get output config: {}", e),
                source: Some(Box::new(e)),
            })?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let graph = Arc::new(Mutex::new(RenderGraph::new(config.sample_rate.0)));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, Arc::clone(&graph))?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, Arc::clone(&graph))?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, Arc::clone(&graph))?,
            other => {
                return Err(BinauralError::UnsupportedSampleFormat {
                    format: other.to_string(),
                })
            }
        };

        // Some hosts start streams immediately; the context starts suspended
        if let Err(e) = stream.pause() {
            tracing::debug!(error = %e, "output stream cannot be paused");
        }

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        tracing::info!(
            device = %device_name,
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = %sample_format,
            "opened audio output"
        );

        Ok(DeviceContext {
            graph,
            stream,
            state: ContextState::Suspended,
            device_name,
        })
    }
}

/// Context backed by a live cpal output stream
pub struct DeviceContext {
    graph: Arc<Mutex<RenderGraph>>,
    /// Output stream (kept alive)
    stream: cpal::Stream,
    state: ContextState,
    device_name: String,
}

impl DeviceContext {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        match self.graph.lock() {
            Ok(graph) => graph.sample_rate(),
            Err(poisoned) => poisoned.into_inner().sample_rate(),
        }
    }
}

impl AudioContext for DeviceContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        self.stream.play().map_err(|e| BinauralError::Stream {
            reason: format!("failed to start output stream: {}", e),
        })?;
        self.state = ContextState::Running;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        match self.graph.lock() {
            Ok(graph) => graph.current_time(),
            Err(poisoned) => poisoned.into_inner().current_time(),
        }
    }

    fn with_graph<R>(&mut self, f: impl FnOnce(&mut RenderGraph) -> R) -> Result<R> {
        let mut graph = self
            .graph
            .lock()
            .map_err(|_| BinauralError::scheduling("render graph lock poisoned"))?;
        Ok(f(&mut graph))
    }
}

/// Build an output stream that pulls frames from the shared graph
fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    graph: Arc<Mutex<RenderGraph>>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                match graph.lock() {
                    Ok(mut graph) => graph.render(&mut scratch, channels),
                    // The engine panicked mid-schedule; play silence
                    Err(_) => scratch.fill(0.0),
                }
                for (out, sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(*sample);
                }
            },
            |err| tracing::error!(error = %err, "audio stream error"),
            None,
        )
        .map_err(|e| BinauralError::Stream {
            reason: format!("failed to build output stream: {}", e),
        })
}
