use crate::math::Transform;

use super::{registry::ParticipantRegistry, ParticipantId};

/// What a billboard panel turns to face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookAtTarget {
    #[default]
    LocalViewpoint,
    RemoteHead(ParticipantId),
}

/// A display panel that keeps facing the presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    pub name: String,
    pub target: LookAtTarget,
}

impl Billboard {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self {
            name: name.as_ref().to_string(),
            target: LookAtTarget::default(),
        }
    }

    /// Resolves the target to a world-space pose.
    ///
    /// A remote target whose participant has left falls back to the local viewpoint.
    pub fn target_transform(&self, registry: &ParticipantRegistry, anchor: &Transform, local_viewpoint: &Transform) -> Transform {
        match self.target {
            LookAtTarget::LocalViewpoint => *local_viewpoint,
            LookAtTarget::RemoteHead(user_id) => registry
                .get(user_id)
                .map(|participant| anchor.compose(&participant.proxy.local_transform))
                .unwrap_or(*local_viewpoint),
        }
    }
}

/// Target the billboards should face for `presenter_id`.
///
/// Only reads the registry. A presenter without an entry yet is still targeted
/// by ID and resolves once its first pose arrives.
pub fn resolve_presenter(registry: &ParticipantRegistry, presenter_id: ParticipantId) -> LookAtTarget {
    if registry.is_local(presenter_id) {
        LookAtTarget::LocalViewpoint
    } else {
        LookAtTarget::RemoteHead(presenter_id)
    }
}

pub fn assign_target(billboards: &mut [Billboard], target: LookAtTarget) {
    for billboard in billboards.iter_mut() {
        log::debug!("Billboard '{}' now faces {:?}", billboard.name, target);
        billboard.target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vector3F};

    #[test]
    fn test_local_presenter_targets_viewpoint() {
        let registry = ParticipantRegistry::new(Some(1));
        assert_eq!(resolve_presenter(&registry, 1), LookAtTarget::LocalViewpoint);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_presenter_is_targeted_without_entry() {
        let registry = ParticipantRegistry::new(Some(1));
        assert_eq!(resolve_presenter(&registry, 4), LookAtTarget::RemoteHead(4));
        assert!(!registry.contains(4));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_presenter_pose_resolves_after_first_update() {
        let mut registry = ParticipantRegistry::new(Some(1));
        let mut panel = Billboard::new("Info");
        panel.target = resolve_presenter(&registry, 4);

        let viewpoint = Transform::identity();
        assert_eq!(panel.target_transform(&registry, &Transform::identity(), &viewpoint), viewpoint);

        registry.update_pose(4, Vector3F::new(0.0, 2.0, 0.0), Quaternion::IDENTITY);
        let target = panel.target_transform(&registry, &Transform::identity(), &viewpoint);
        assert_eq!(target.position, Vector3F::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_target_transform_composes_with_anchor() {
        let mut registry = ParticipantRegistry::new(Some(1));
        registry.update_pose(2, Vector3F::new(1.0, 0.0, 0.0), Quaternion::IDENTITY);

        let anchor = Transform::identity().with_position(Vector3F::new(0.0, 0.0, 5.0));
        let viewpoint = Transform::identity();
        let mut panels = vec![Billboard::new("Info"), Billboard::new("Report")];
        assign_target(&mut panels, LookAtTarget::RemoteHead(2));

        for panel in &panels {
            let target = panel.target_transform(&registry, &anchor, &viewpoint);
            assert_eq!(target.position, Vector3F::new(1.0, 0.0, 5.0));
        }
    }

    #[test]
    fn test_departed_presenter_falls_back_to_viewpoint() {
        let mut registry = ParticipantRegistry::new(Some(1));
        registry.get_or_create(2);
        let mut panel = Billboard::new("Info");
        panel.target = resolve_presenter(&registry, 2);
        registry.remove(2);

        let viewpoint = Transform::identity().with_position(Vector3F::new(0.0, 1.6, 0.0));
        assert_eq!(panel.target_transform(&registry, &Transform::identity(), &viewpoint), viewpoint);
    }
}
