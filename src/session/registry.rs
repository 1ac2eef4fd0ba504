use std::collections::HashMap;

use rand::seq::IndexedRandom;

use crate::math::{
    Quaternion,
    Transform,
    Vector3F
};

use super::ParticipantId;

const PROXY_COLORS: [[u8; 3]; 6] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 0, 255],
    [0, 255, 255],
    [255, 255, 0],
];

/// Local stand-in for a remote participant's head.
///
/// The pose is expressed in the frame of the registry's anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadProxy {
    pub local_transform: Transform,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteParticipant {
    pub user_id: ParticipantId,
    pub proxy: HeadProxy,
}

/// One entry per remote participant, keyed by participant ID.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    local_id: Option<ParticipantId>,
    remote_heads: HashMap<ParticipantId, RemoteParticipant>,
}

impl HeadProxy {
    fn spawn() -> Self {
        let color = *PROXY_COLORS.choose(&mut rand::rng()).unwrap_or(&PROXY_COLORS[0]);
        Self {
            local_transform: Transform::identity(),
            color,
        }
    }
}

impl ParticipantRegistry {
    pub fn new(local_id: Option<ParticipantId>) -> Self {
        Self {
            local_id,
            remote_heads: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> Option<ParticipantId> {
        self.local_id
    }

    /// The local ID may only become known once the session is connected.
    pub fn set_local_id(&mut self, local_id: Option<ParticipantId>) {
        if let Some(id) = local_id {
            if self.remote_heads.remove(&id).is_some() {
                log::warn!("Dropped head proxy registered for what is now the local participant {id}");
            }
        }
        self.local_id = local_id;
    }

    pub fn is_local(&self, user_id: ParticipantId) -> bool {
        self.local_id == Some(user_id)
    }

    /// Returns the entry for a remote participant, creating it on first use.
    /// The local participant is never tracked and yields `None`.
    pub fn get_or_create(&mut self, user_id: ParticipantId) -> Option<&mut RemoteParticipant> {
        if self.is_local(user_id) {
            return None;
        }

        let entry = self.remote_heads.entry(user_id).or_insert_with(|| {
            log::info!("Creating head proxy for participant {user_id}");
            RemoteParticipant {
                user_id,
                proxy: HeadProxy::spawn(),
            }
        });
        Some(entry)
    }

    /// Releases the participant's proxy. Unknown IDs are ignored.
    pub fn remove(&mut self, user_id: ParticipantId) -> Option<RemoteParticipant> {
        let removed = self.remote_heads.remove(&user_id);
        match &removed {
            Some(_) => log::info!("Removed head proxy of participant {user_id}"),
            None => log::debug!("No head proxy for participant {user_id}, nothing to remove"),
        }
        removed
    }

    /// Applies an anchor-local pose, implicitly re-joining unknown participants.
    pub fn update_pose(&mut self, user_id: ParticipantId, position: Vector3F, rotation: Quaternion) -> bool {
        match self.get_or_create(user_id) {
            Some(participant) => {
                participant.proxy.local_transform = Transform::new(position, rotation);
                log::trace!("Participant {user_id} head at {position} {rotation}");
                true
            },
            None => {
                log::trace!("Ignoring own head transform echo");
                false
            }
        }
    }

    pub fn get(&self, user_id: ParticipantId) -> Option<&RemoteParticipant> {
        self.remote_heads.get(&user_id)
    }

    pub fn contains(&self, user_id: ParticipantId) -> bool {
        self.remote_heads.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.remote_heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remote_heads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteParticipant> {
        self.remote_heads.values()
    }

    pub fn clear(&mut self) {
        self.remote_heads.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: ParticipantId = 1;

    #[test]
    fn test_get_or_create_is_stable() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        let first = registry.get_or_create(2).unwrap().clone();
        let second = registry.get_or_create(2).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_local_is_none() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        assert!(registry.get_or_create(LOCAL).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        registry.get_or_create(2);
        assert!(registry.remove(2).is_some());
        assert!(registry.remove(2).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_pose_creates_entry() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        let position = Vector3F::new(1.0, 0.0, 0.0);
        assert!(registry.update_pose(5, position, Quaternion::IDENTITY));

        let entry = registry.get(5).unwrap();
        assert_eq!(entry.proxy.local_transform.position, position);
        assert_eq!(entry.proxy.local_transform.rotation, Quaternion::IDENTITY);
    }

    #[test]
    fn test_update_pose_from_local_is_ignored() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        assert!(!registry.update_pose(LOCAL, Vector3F::new(1.0, 0.0, 0.0), Quaternion::IDENTITY));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_setting_local_id_evicts_matching_entry() {
        let mut registry = ParticipantRegistry::new(None);
        registry.get_or_create(3);
        registry.get_or_create(4);
        registry.set_local_id(Some(3));
        assert!(!registry.contains(3));
        assert!(registry.contains(4));
        assert!(registry.get_or_create(3).is_none());
    }

    #[test]
    fn test_proxy_color_from_palette() {
        let mut registry = ParticipantRegistry::new(Some(LOCAL));
        let color = registry.get_or_create(9).unwrap().proxy.color;
        assert!(PROXY_COLORS.contains(&color));
    }
}
