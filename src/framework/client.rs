//! # Resolver Client
//!
//! This module defines the handle UI code holds for one field's resolver.

use crate::framework::error::FrameworkError;
use crate::framework::message::{ResolverRequest, ResolverState};
use crate::model::Suggestion;
use tokio::sync::{mpsc, oneshot, watch};

/// A cloneable handle to a running [`QueryResolver`](crate::framework::QueryResolver).
///
/// Requests go over an mpsc channel; state comes back over a watch channel,
/// so any number of observers can follow the suggestions without asking.
/// When the last client is dropped the resolver task exits.
#[derive(Clone)]
pub struct ResolverClient {
    sender: mpsc::Sender<ResolverRequest>,
    state: watch::Receiver<ResolverState>,
}

impl ResolverClient {
    pub fn new(sender: mpsc::Sender<ResolverRequest>, state: watch::Receiver<ResolverState>) -> Self {
        Self { sender, state }
    }

    /// Reports the current field text.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), FrameworkError> {
        self.sender
            .send(ResolverRequest::Submit { text: text.into() })
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }

    /// Reports focus loss; suggestions are dropped.
    pub async fn clear(&self) -> Result<(), FrameworkError> {
        self.sender
            .send(ResolverRequest::Clear)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }

    /// Picks a suggestion by position and clears the list.
    pub async fn select(&self, index: usize) -> Result<Option<Suggestion>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResolverRequest::Select { index, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// State after every earlier request has been handled.
    pub async fn snapshot(&self) -> Result<ResolverState, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResolverRequest::Snapshot { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// Last published state, without a round trip.
    pub fn current(&self) -> ResolverState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolverState> {
        self.state.clone()
    }
}
