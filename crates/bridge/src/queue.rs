// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO of outbound frames held while the link is down.
//!
//! When full, the oldest frame is evicted to admit the newest: recent
//! control intent (a cancel, a config change) is worth more than a stale
//! request. Frames leave the queue in the order they entered it.

use std::collections::VecDeque;

/// Drop-oldest queue of serialized frames.
#[derive(Debug)]
pub struct PendingQueue {
    frames: VecDeque<String>,
    capacity: usize,
    evicted: u64,
}

impl PendingQueue {
    /// Creates a queue holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PendingQueue {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Appends a frame, returning the evicted oldest frame if the queue was full.
    pub fn push(&mut self, frame: String) -> Option<String> {
        let evicted = if self.frames.len() >= self.capacity {
            self.evicted += 1;
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    /// Puts frames that were already in flight back at the head of the queue.
    ///
    /// They predate anything currently queued, so they go in front in their
    /// original order. Overflow evicts from the front, as with `push`.
    pub fn restore(&mut self, frames: Vec<String>) -> usize {
        for frame in frames.into_iter().rev() {
            self.frames.push_front(frame);
        }
        let mut dropped = 0;
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
            self.evicted += 1;
            dropped += 1;
        }
        dropped
    }

    /// Removes and returns every queued frame, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames evicted since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
