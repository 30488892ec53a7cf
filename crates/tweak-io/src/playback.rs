//! Audio-thread half of a live session.
//!
//! The control thread never touches a graph once it has been sent. It pushes
//! [`Command`]s through a bounded channel; [`Renderer::fill`] drains them at
//! the top of each device callback, swaps graphs, and sends the graph it
//! displaced back on the retire channel so deallocation happens off the audio
//! thread. Installing a graph and retiring the previous one happen in the same
//! callback, so two graphs never play at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};

use tweak_core::CompiledGraph;

/// Commands from the control thread.
pub(crate) enum Command {
    /// Replace the current graph.
    Install {
        generation: u64,
        graph: Box<CompiledGraph>,
    },
    /// Drop the current graph and output silence.
    Clear,
}

/// State shared between the session and the callbacks.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Generation of the last graph that played to its end.
    ended: AtomicU64,
    /// First stream error reported by the backend.
    error: Mutex<Option<String>>,
}

impl Shared {
    pub(crate) fn ended_generation(&self) -> u64 {
        self.ended.load(Ordering::Acquire)
    }

    pub(crate) fn report_error(&self, message: &str) {
        if let Ok(mut slot) = self.error.lock()
            && slot.is_none()
        {
            *slot = Some(message.to_owned());
        }
    }

    pub(crate) fn take_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|mut slot| slot.take())
    }
}

struct Active {
    generation: u64,
    graph: Box<CompiledGraph>,
    /// Next frame to copy out of the graph's current block.
    cursor: usize,
    /// Valid frames in the graph's current block.
    valid: usize,
    done: bool,
}

/// Owns the playing graph on the audio thread.
pub(crate) struct Renderer {
    commands: Receiver<Command>,
    retired: SyncSender<Box<CompiledGraph>>,
    shared: Arc<Shared>,
    device_channels: usize,
    current: Option<Active>,
}

impl Renderer {
    pub(crate) fn new(
        commands: Receiver<Command>,
        retired: SyncSender<Box<CompiledGraph>>,
        shared: Arc<Shared>,
        device_channels: usize,
    ) -> Self {
        Self {
            commands,
            retired,
            shared,
            device_channels: device_channels.max(1),
            current: None,
        }
    }

    /// Fills one interleaved device buffer.
    pub(crate) fn fill(&mut self, data: &mut [f32]) {
        while let Ok(command) = self.commands.try_recv() {
            let next = match command {
                Command::Install { generation, graph } => Some(Active {
                    generation,
                    graph,
                    cursor: 0,
                    valid: 0,
                    done: false,
                }),
                Command::Clear => None,
            };
            let previous = std::mem::replace(&mut self.current, next);
            self.retire(previous);
        }

        let Some(active) = self.current.as_mut() else {
            data.fill(0.0);
            return;
        };

        for frame in data.chunks_mut(self.device_channels) {
            if active.cursor >= active.valid {
                if !active.done && active.graph.is_finished() {
                    active.done = true;
                    self.shared
                        .ended
                        .store(active.generation, Ordering::Release);
                }
                if active.done {
                    frame.fill(0.0);
                    continue;
                }
                active.valid = active.graph.process_block();
                active.cursor = 0;
            }

            let out = active.graph.output();
            let graph_channels = out.len();
            for (d, sample) in frame.iter_mut().enumerate() {
                *sample = if graph_channels == 1 {
                    out[0][active.cursor]
                } else if d < graph_channels {
                    out[d][active.cursor]
                } else {
                    0.0
                };
            }
            active.cursor += 1;
        }
    }

    fn retire(&self, active: Option<Active>) {
        if let Some(active) = active {
            // A full queue means the control thread is not draining; the
            // graph is then dropped here.
            let _ = self.retired.try_send(active.graph);
        }
    }
}
