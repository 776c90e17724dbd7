//! Command enablement: "is this action legal right now" as a boolean.
//!
//! A `RelayCommand` pairs a legality predicate with a change notifier. The
//! owner of the predicate's inputs calls `raise_can_execute_changed` when
//! they change. An `EnablementBridge` listens to one relay command at a time
//! and republishes the predicate's value as a flag that input handling can
//! read without knowing where the rule comes from.
//!
//! Subscriptions are owned values that detach on drop, so rebinding a bridge
//! can never leave a stale handler behind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// A multicast "something changed" signal.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler. It stays attached until the returned
    /// `Subscription` is dropped.
    #[must_use = "dropping the subscription detaches the handler"]
    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let handler: Handler = Rc::new(handler);
        registry.handlers.push((id, handler));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Invoke every attached handler.
    pub fn notify(&self) {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }
}

/// An attached handler. Dropping it detaches the handler.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// A legality predicate plus the signal announcing that it may have changed.
#[derive(Clone)]
pub struct RelayCommand {
    can_execute: Rc<dyn Fn() -> bool>,
    changed: ChangeNotifier,
}

impl fmt::Debug for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCommand")
            .field("can_execute", &(self.can_execute)())
            .field("changed", &self.changed)
            .finish()
    }
}

impl RelayCommand {
    pub fn new(can_execute: impl Fn() -> bool + 'static) -> Self {
        Self {
            can_execute: Rc::new(can_execute),
            changed: ChangeNotifier::new(),
        }
    }

    /// A command that is always legal.
    pub fn always() -> Self {
        Self::new(|| true)
    }

    pub fn can_execute(&self) -> bool {
        (self.can_execute)()
    }

    pub fn can_execute_changed(&self) -> &ChangeNotifier {
        &self.changed
    }

    /// Tell listeners to re-evaluate `can_execute`.
    pub fn raise_can_execute_changed(&self) {
        self.changed.notify();
    }

    /// Whether two handles share the same predicate and notifier.
    pub fn ptr_eq(&self, other: &RelayCommand) -> bool {
        Rc::ptr_eq(&self.changed.registry, &other.changed.registry)
    }
}

/// Republishes a relay command's legality as a boolean flag.
///
/// Holds at most one subscription. With no command bound the flag keeps
/// its last value (initially `true`).
#[derive(Debug)]
pub struct EnablementBridge {
    command: Option<RelayCommand>,
    subscription: Option<Subscription>,
    enabled: Rc<Cell<bool>>,
}

impl Default for EnablementBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EnablementBridge {
    pub fn new() -> Self {
        Self {
            command: None,
            subscription: None,
            enabled: Rc::new(Cell::new(true)),
        }
    }

    /// A bridge already bound to `command`.
    pub fn bound_to(command: RelayCommand) -> Self {
        let mut bridge = Self::new();
        bridge.bind(Some(command));
        bridge
    }

    /// Swap the observed command. The old subscription is dropped in the
    /// same step the new one is installed, and the flag is refreshed from
    /// the new command.
    pub fn bind(&mut self, command: Option<RelayCommand>) {
        if let (Some(old), Some(new)) = (&self.command, &command)
            && old.ptr_eq(new)
        {
            return;
        }
        let subscription = command.as_ref().map(|cmd| {
            let can_execute = Rc::clone(&cmd.can_execute);
            let enabled = Rc::clone(&self.enabled);
            cmd.changed.subscribe(move || {
                let value = can_execute();
                log::trace!("enablement republished: {value}");
                enabled.set(value);
            })
        });
        if let Some(cmd) = &command {
            self.enabled.set(cmd.can_execute());
        }
        self.subscription = subscription;
        self.command = command;
    }

    pub fn command(&self) -> Option<&RelayCommand> {
        self.command.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Override the flag directly. The next notification from the bound
    /// command replaces it.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_follows_notifications() {
        let legal = Rc::new(Cell::new(true));
        let flag = Rc::clone(&legal);
        let command = RelayCommand::new(move || flag.get());
        let bridge = EnablementBridge::bound_to(command.clone());
        assert!(bridge.is_enabled());

        legal.set(false);
        // Not re-evaluated until the source says so.
        assert!(bridge.is_enabled());
        command.raise_can_execute_changed();
        assert!(!bridge.is_enabled());
    }

    #[test]
    fn rebinding_keeps_exactly_one_subscription() {
        let first = RelayCommand::new(|| true);
        let second = RelayCommand::new(|| false);
        let mut bridge = EnablementBridge::bound_to(first.clone());
        assert_eq!(first.can_execute_changed().subscriber_count(), 1);

        bridge.bind(Some(second.clone()));
        assert_eq!(first.can_execute_changed().subscriber_count(), 0);
        assert_eq!(second.can_execute_changed().subscriber_count(), 1);
        assert!(!bridge.is_enabled());

        // The old command no longer drives the flag.
        bridge.set_enabled(true);
        first.raise_can_execute_changed();
        assert!(bridge.is_enabled());
    }

    #[test]
    fn binding_the_same_command_twice_does_not_duplicate() {
        let command = RelayCommand::always();
        let mut bridge = EnablementBridge::bound_to(command.clone());
        bridge.bind(Some(command.clone()));
        assert_eq!(command.can_execute_changed().subscriber_count(), 1);
    }

    #[test]
    fn unbinding_detaches() {
        let command = RelayCommand::always();
        let mut bridge = EnablementBridge::bound_to(command.clone());
        bridge.bind(None);
        assert_eq!(command.can_execute_changed().subscriber_count(), 0);
        assert!(bridge.command().is_none());
    }

    #[test]
    fn dropping_the_bridge_detaches() {
        let command = RelayCommand::always();
        {
            let _bridge = EnablementBridge::bound_to(command.clone());
            assert_eq!(command.can_execute_changed().subscriber_count(), 1);
        }
        assert_eq!(command.can_execute_changed().subscriber_count(), 0);
    }
}
