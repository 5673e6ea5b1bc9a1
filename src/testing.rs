//! Receivers and senders for exercising operations step by step.

use crate::{
    Blocking, Completion, Connect, ContinuationInfo, OperationState, Receiver, Sender, Slot,
    StopToken,
};
use alloc::{boxed::Box, collections::VecDeque, format, rc::Rc, string::String, vec::Vec};
use core::{cell::RefCell, marker::PhantomData, marker::PhantomPinned, pin::Pin};

/// Receiver that records every completion it gets.
pub(crate) struct Recorder<V, E> {
    events: Rc<RefCell<Vec<Completion<V, E>>>>,
    stop_token: StopToken,
}

impl<V, E> Recorder<V, E> {
    pub(crate) fn new() -> Self {
        Recorder::with_stop_token(StopToken::never())
    }

    pub(crate) fn with_stop_token(stop_token: StopToken) -> Self {
        Recorder {
            events: Rc::new(RefCell::new(Vec::new())),
            stop_token,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Removes and returns the only completion recorded so far.
    pub(crate) fn take(&self) -> Completion<V, E> {
        let mut events = self.events.borrow_mut();
        assert_eq!(events.len(), 1, "expected exactly one completion");
        events.pop().expect("one completion")
    }
}

impl<V: Clone, E: Clone> Recorder<V, E> {
    pub(crate) fn events(&self) -> Vec<Completion<V, E>> {
        self.events.borrow().clone()
    }
}

impl<V, E> Clone for Recorder<V, E> {
    fn clone(&self) -> Self {
        Recorder {
            events: self.events.clone(),
            stop_token: self.stop_token.clone(),
        }
    }
}

impl<V, E> Receiver<V, E> for Recorder<V, E> {
    fn set_value(self, value: V) {
        self.events.borrow_mut().push(Completion::Value(value));
    }

    fn set_error(self, error: E) {
        self.events.borrow_mut().push(Completion::Error(error));
    }

    fn set_done(self) {
        self.events.borrow_mut().push(Completion::Done);
    }

    fn stop_token(&self) -> StopToken {
        self.stop_token.clone()
    }
}

/// Shared, ordered log of what scripted operations did.
#[derive(Clone, Default)]
pub(crate) struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    pub(crate) fn new() -> Self {
        Journal::default()
    }

    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

/// Value that notes its own destruction.
pub(crate) struct Tracked {
    journal: Journal,
    label: &'static str,
}

impl Tracked {
    pub(crate) fn new(journal: &Journal, label: &'static str) -> Self {
        Tracked {
            journal: journal.clone(),
            label,
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.journal.push(format!("drop {}", self.label));
    }
}

/// Single threaded queue of deferred completions.
#[derive(Clone, Default)]
pub(crate) struct RunLoop {
    queue: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
}

impl RunLoop {
    pub(crate) fn new() -> Self {
        RunLoop::default()
    }

    pub(crate) fn schedule(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Runs tasks, including ones scheduled while running, until none are left.
    pub(crate) fn run(&self) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

/// Sender with a fixed completion that journals connect, start and drop of
/// its operation.
///
/// A scripted sender honours a stop request seen at start by completing with done.
pub(crate) struct Scripted<T, E> {
    completion: Completion<T, E>,
    label: &'static str,
    journal: Journal,
    run_loop: Option<RunLoop>,
    inspect: bool,
    explode_on_drop: bool,
}

impl<T, E> Scripted<T, E> {
    fn new(journal: &Journal, label: &'static str, completion: Completion<T, E>) -> Self {
        Scripted {
            completion,
            label,
            journal: journal.clone(),
            run_loop: None,
            inspect: false,
            explode_on_drop: false,
        }
    }

    pub(crate) fn value(journal: &Journal, label: &'static str, value: T) -> Self {
        Scripted::new(journal, label, Completion::Value(value))
    }

    pub(crate) fn error(journal: &Journal, label: &'static str, error: E) -> Self {
        Scripted::new(journal, label, Completion::Error(error))
    }

    pub(crate) fn done(journal: &Journal, label: &'static str) -> Self {
        Scripted::new(journal, label, Completion::Done)
    }

    /// Completes from `run_loop` instead of inside `start`.
    pub(crate) fn deferred(mut self, run_loop: &RunLoop) -> Self {
        self.run_loop = Some(run_loop.clone());
        self
    }

    /// Journals the chain of continuations its receiver reports at start.
    pub(crate) fn inspecting(mut self) -> Self {
        self.inspect = true;
        self
    }

    /// Makes dropping the connected operation panic.
    pub(crate) fn exploding_on_drop(mut self) -> Self {
        self.explode_on_drop = true;
        self
    }
}

impl<T, E> Sender for Scripted<T, E> {
    type Value = T;
    type Error = E;

    fn blocking(&self) -> Blocking {
        match self.run_loop {
            Some(_) => Blocking::Never,
            None => Blocking::AlwaysInline,
        }
    }
}

pub(crate) struct ScriptedOperation<T, E, R> {
    completion: Option<Completion<T, E>>,
    receiver: Option<R>,
    label: &'static str,
    journal: Journal,
    run_loop: Option<RunLoop>,
    inspect: bool,
    explode_on_drop: bool,
    _pinned: PhantomPinned,
}

impl<T: 'static, E: 'static, R: Receiver<T, E> + 'static> Connect<R> for Scripted<T, E> {
    type Operation = ScriptedOperation<T, E, R>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        self.journal.push(format!("connect {}", self.label));
        place.fill(ScriptedOperation {
            completion: Some(self.completion),
            receiver: Some(receiver),
            label: self.label,
            journal: self.journal,
            run_loop: self.run_loop,
            inspect: self.inspect,
            explode_on_drop: self.explode_on_drop,
            _pinned: PhantomPinned,
        });
    }
}

impl<T: 'static, E: 'static, R: Receiver<T, E> + 'static> OperationState
    for ScriptedOperation<T, E, R>
{
    fn start(self: Pin<&mut Self>) {
        let this = unsafe { self.get_unchecked_mut() };
        this.journal.push(format!("start {}", this.label));
        let receiver = this.receiver.take().expect("scripted operation started twice");
        let completion = this.completion.take().expect("scripted operation started twice");

        if this.inspect {
            let mut links = Vec::new();
            walk(ContinuationInfo::from_receiver::<T, E, R>(&receiver), &mut links);
            this.journal
                .push(format!("chain {}: {}", this.label, links.join(" > ")));
        }

        if receiver.stop_token().stop_requested() {
            this.journal.push(format!("stopped {}", this.label));
            receiver.set_done();
            return;
        }
        match this.run_loop.clone() {
            Some(run_loop) => run_loop.schedule(move || completion.complete(receiver)),
            None => completion.complete(receiver),
        }
    }
}

impl<T, E, R> Drop for ScriptedOperation<T, E, R> {
    fn drop(&mut self) {
        self.journal.push(format!("drop {}", self.label));
        if self.explode_on_drop {
            panic!("drop exploded");
        }
    }
}

fn walk(info: ContinuationInfo<'_>, links: &mut Vec<&'static str>) {
    let name = info.type_name();
    let name = name.split('<').next().unwrap_or(name);
    links.push(name.rsplit("::").next().unwrap_or(name));
    info.visit_continuations(&mut |next| walk(next, links));
}

/// Sender whose connect panics, optionally after building part of its
/// operation.
pub(crate) struct Exploding<T, E> {
    built: Option<(Journal, &'static str)>,
    ty: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Exploding<T, E> {
    pub(crate) fn new() -> Self {
        Exploding {
            built: None,
            ty: PhantomData,
        }
    }

    /// Fills the place with a journaled operation before panicking.
    pub(crate) fn after_building(journal: &Journal, label: &'static str) -> Self {
        Exploding {
            built: Some((journal.clone(), label)),
            ty: PhantomData,
        }
    }
}

impl<T, E> Sender for Exploding<T, E> {
    type Value = T;
    type Error = E;
}

impl<T: 'static, E: 'static, R: Receiver<T, E> + 'static> Connect<R> for Exploding<T, E> {
    type Operation = ScriptedOperation<T, E, R>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        if let Some((journal, label)) = self.built {
            Scripted::<T, E>::done(&journal, label).connect(receiver, place);
        }
        panic!("connect exploded")
    }
}
