// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Mutex;

/// A fan-out event channel.
///
/// Every subscriber owns a flume receiver. Events are delivered to the live
/// subscribers in subscription order; subscribers whose receiver was dropped
/// are pruned on the next publish.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus without subscribers.
    pub fn new() -> Self {
        log::debug!("EventBus initialized.");
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber and returns its unbounded receiver.
    ///
    /// ## Returns
    /// The receiving end; drop it to unsubscribe.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.lock().push(sender);
        receiver
    }

    /// Delivers `event` to every live subscriber.
    ///
    /// ## Returns
    /// The number of subscribers that received the event.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        if subscribers.len() < before {
            log::trace!(
                "Pruned {} disconnected subscriber(s).",
                before - subscribers.len()
            );
        }
        subscribers.len()
    }

    /// Number of subscribers registered (including ones not yet pruned).
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<flume::Sender<T>>> {
        // A panic while holding the lock cannot leave the vector half-updated.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
