use crate::error::{Result, SoundflowsError};
use crate::traits::{
    AudioBackend, AudioContext, AudioNode, ContextState, GainNode, MediaElement, NodeId,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One scheduled change to a gain parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    SetValueAtTime { value: f32, time: f64 },
    LinearRamp { value: f32, end_time: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GainRecord {
    pub value: f32,
    pub automation: Vec<Automation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRecord {
    pub url: String,
    pub looping: bool,
    pub playing: bool,
    pub released: bool,
    pub ended: bool,
    pub play_calls: usize,
}

#[derive(Debug)]
struct FakeGraph {
    next_id: u64,
    contexts_created: usize,
    resumes: usize,
    state: Option<ContextState>,
    current_time: f64,
    edges: Vec<(NodeId, NodeId)>,
    gains: BTreeMap<NodeId, GainRecord>,
    elements: BTreeMap<NodeId, ElementRecord>,
}

impl FakeGraph {
    fn allocate(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }
}

type Shared = Arc<Mutex<FakeGraph>>;

fn lock(graph: &Shared) -> MutexGuard<'_, FakeGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Audio backend that records the graph instead of producing sound
///
/// Clones share the same recorded graph, so a test can keep one clone for
/// inspection while the engine owns another.
#[derive(Debug, Clone)]
pub struct FakeAudioBackend {
    graph: Shared,
    available: bool,
    start_suspended: bool,
    failing_play: Vec<String>,
    failing_source: Vec<String>,
}

impl FakeAudioBackend {
    pub fn new() -> Self {
        Self {
            graph: Arc::new(Mutex::new(FakeGraph {
                next_id: 0,
                contexts_created: 0,
                resumes: 0,
                state: None,
                current_time: 0.0,
                edges: Vec::new(),
                gains: BTreeMap::new(),
                elements: BTreeMap::new(),
            })),
            available: true,
            start_suspended: false,
            failing_play: Vec::new(),
            failing_source: Vec::new(),
        }
    }

    /// Context creation fails
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// New contexts start suspended
    pub fn suspended() -> Self {
        Self {
            start_suspended: true,
            ..Self::new()
        }
    }

    /// `play()` rejects for elements whose URL contains `pattern`
    pub fn failing_play(mut self, pattern: impl Into<String>) -> Self {
        self.failing_play.push(pattern.into());
        self
    }

    /// `create_media_source` fails for elements whose URL contains `pattern`
    pub fn failing_source(mut self, pattern: impl Into<String>) -> Self {
        self.failing_source.push(pattern.into());
        self
    }

    pub fn contexts_created(&self) -> usize {
        lock(&self.graph).contexts_created
    }

    pub fn resume_count(&self) -> usize {
        lock(&self.graph).resumes
    }

    /// State of the most recently created context
    pub fn context_state(&self) -> Option<ContextState> {
        lock(&self.graph).state
    }

    pub fn set_current_time(&self, seconds: f64) {
        lock(&self.graph).current_time = seconds;
    }

    /// Live connections as `(from, to)` pairs
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        lock(&self.graph).edges.clone()
    }

    pub fn edge_count(&self) -> usize {
        lock(&self.graph).edges.len()
    }

    pub fn gain(&self, id: NodeId) -> Option<GainRecord> {
        lock(&self.graph).gains.get(&id).cloned()
    }

    /// Every gain node created so far, in creation order
    pub fn gains(&self) -> Vec<(NodeId, GainRecord)> {
        lock(&self.graph)
            .gains
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect()
    }

    /// Every media element created so far, in creation order
    pub fn elements(&self) -> Vec<ElementRecord> {
        lock(&self.graph).elements.values().cloned().collect()
    }

    /// Element records whose URL contains `pattern`
    pub fn elements_for(&self, pattern: &str) -> Vec<ElementRecord> {
        lock(&self.graph)
            .elements
            .values()
            .filter(|element| element.url.contains(pattern))
            .cloned()
            .collect()
    }

    /// Mark elements whose URL contains `pattern` as having played to the end
    pub fn set_ended(&self, pattern: &str) {
        let mut graph = lock(&self.graph);
        for element in graph.elements.values_mut() {
            if element.url.contains(pattern) {
                element.ended = true;
                element.playing = false;
            }
        }
    }
}

impl Default for FakeAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for FakeAudioBackend {
    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        if !self.available {
            return Err(SoundflowsError::AudioUnavailable(
                "no audio context implementation".to_string(),
            ));
        }

        let mut graph = lock(&self.graph);
        graph.contexts_created += 1;
        graph.state = Some(if self.start_suspended {
            ContextState::Suspended
        } else {
            ContextState::Running
        });
        let destination = graph.allocate();
        drop(graph);

        Ok(Box::new(FakeContext {
            graph: Arc::clone(&self.graph),
            destination,
            failing_play: self.failing_play.clone(),
            failing_source: self.failing_source.clone(),
        }))
    }
}

struct FakeContext {
    graph: Shared,
    destination: NodeId,
    failing_play: Vec<String>,
    failing_source: Vec<String>,
}

#[async_trait]
impl AudioContext for FakeContext {
    fn state(&self) -> ContextState {
        lock(&self.graph).state.unwrap_or(ContextState::Closed)
    }

    async fn resume(&mut self) -> Result<()> {
        let mut graph = lock(&self.graph);
        graph.resumes += 1;
        if graph.state == Some(ContextState::Suspended) {
            graph.state = Some(ContextState::Running);
        }
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.graph).state = Some(ContextState::Closed);
    }

    fn current_time(&self) -> f64 {
        lock(&self.graph).current_time
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_gain(&mut self) -> Result<Box<dyn GainNode>> {
        let mut graph = lock(&self.graph);
        let id = graph.allocate();
        graph.gains.insert(
            id,
            GainRecord {
                value: 1.0,
                automation: Vec::new(),
            },
        );
        drop(graph);
        Ok(Box::new(FakeGain {
            graph: Arc::clone(&self.graph),
            id,
        }))
    }

    fn create_media_element(&mut self, url: &str) -> Result<Box<dyn MediaElement>> {
        let mut graph = lock(&self.graph);
        let id = graph.allocate();
        graph.elements.insert(
            id,
            ElementRecord {
                url: url.to_string(),
                ..ElementRecord::default()
            },
        );
        drop(graph);
        let fails = self
            .failing_play
            .iter()
            .any(|pattern| url.contains(pattern.as_str()));
        Ok(Box::new(FakeElement {
            graph: Arc::clone(&self.graph),
            id,
            url: url.to_string(),
            fails,
        }))
    }

    fn create_media_source(&mut self, element: &dyn MediaElement) -> Result<Box<dyn AudioNode>> {
        if self
            .failing_source
            .iter()
            .any(|pattern| element.url().contains(pattern.as_str()))
        {
            return Err(SoundflowsError::AudioUnavailable(format!(
                "media source rejected for {}",
                element.url()
            )));
        }
        let id = lock(&self.graph).allocate();
        Ok(Box::new(FakeNode {
            graph: Arc::clone(&self.graph),
            id,
        }))
    }
}

fn connect(graph: &Shared, from: NodeId, to: NodeId) {
    lock(graph).edges.push((from, to));
}

fn disconnect(graph: &Shared, from: NodeId) {
    lock(graph).edges.retain(|(source, _)| *source != from);
}

struct FakeNode {
    graph: Shared,
    id: NodeId,
}

impl AudioNode for FakeNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn connect(&mut self, destination: NodeId) {
        connect(&self.graph, self.id, destination);
    }

    fn disconnect(&mut self) {
        disconnect(&self.graph, self.id);
    }
}

struct FakeGain {
    graph: Shared,
    id: NodeId,
}

impl FakeGain {
    fn update(&self, f: impl FnOnce(&mut GainRecord)) {
        if let Some(record) = lock(&self.graph).gains.get_mut(&self.id) {
            f(record);
        }
    }
}

impl AudioNode for FakeGain {
    fn id(&self) -> NodeId {
        self.id
    }

    fn connect(&mut self, destination: NodeId) {
        connect(&self.graph, self.id, destination);
    }

    fn disconnect(&mut self) {
        disconnect(&self.graph, self.id);
    }
}

impl GainNode for FakeGain {
    fn value(&self) -> f32 {
        lock(&self.graph)
            .gains
            .get(&self.id)
            .map_or(0.0, |record| record.value)
    }

    fn set_value(&mut self, value: f32) {
        self.update(|record| record.value = value);
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.update(|record| {
            record.value = value;
            record.automation.push(Automation::SetValueAtTime { value, time });
        });
    }

    // The fake jumps straight to the ramp target
    fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.update(|record| {
            record.value = value;
            record.automation.push(Automation::LinearRamp { value, end_time });
        });
    }
}

struct FakeElement {
    graph: Shared,
    id: NodeId,
    url: String,
    fails: bool,
}

impl FakeElement {
    fn update<T>(&self, f: impl FnOnce(&mut ElementRecord) -> T) -> Option<T> {
        lock(&self.graph).elements.get_mut(&self.id).map(f)
    }
}

#[async_trait]
impl MediaElement for FakeElement {
    fn id(&self) -> NodeId {
        self.id
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn set_loop(&mut self, looping: bool) {
        self.update(|record| record.looping = looping);
    }

    async fn play(&mut self) -> Result<()> {
        let fails = self.fails;
        self.update(|record| {
            record.play_calls += 1;
            if !fails {
                record.playing = true;
                record.ended = false;
            }
        });
        if fails {
            return Err(SoundflowsError::playback(format!(
                "playback rejected for {}",
                self.url
            )));
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.update(|record| record.playing = false);
    }

    fn release(&mut self) {
        self.update(|record| {
            record.playing = false;
            record.released = true;
        });
    }

    fn has_ended(&self) -> bool {
        lock(&self.graph)
            .elements
            .get(&self.id)
            .is_some_and(|record| record.ended)
    }
}
