//! Registered playlists, in registration order.

use core_library::models::{Playlist, PlaylistId};

#[derive(Debug, Default, Clone)]
pub struct PlaylistRegistry {
    playlists: Vec<Playlist>,
}

impl PlaylistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `incoming`. A playlist whose id is already registered replaces
    /// the existing entry in place. Returns the ids that were merged.
    pub fn merge(&mut self, incoming: Vec<Playlist>) -> Vec<PlaylistId> {
        let mut merged = Vec::with_capacity(incoming.len());
        for playlist in incoming {
            merged.push(playlist.id.clone());
            match self.playlists.iter_mut().find(|p| p.id == playlist.id) {
                Some(existing) => *existing = playlist,
                None => self.playlists.push(playlist),
            }
        }
        merged
    }

    pub fn get(&self, id: &PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlaylistId) -> bool {
        self.get(id).is_some()
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}
