use holograph_session::{
    math::{Quaternion, Transform, Vector3F},
    session::{
        head_manager::HeadManager,
        host::SessionHost,
        messages::{HeadTransformMessage, PresenterIdMessage},
        presenter::{Billboard, LookAtTarget},
        transport::{LoopbackHub, LoopbackTransport, TransportEvent}
    }
};

fn host(hub: &LoopbackHub) -> SessionHost<LoopbackTransport> {
    let heads = HeadManager::new(Transform::identity(), vec![Billboard::new("Panel")]);
    let mut host = SessionHost::new(hub.join(), heads);
    host.initialize();
    host
}

#[test]
fn test_pose_leave_and_stray_rejoin() {
    let hub = LoopbackHub::new();
    let mut a = host(&hub);
    let b = hub.join();
    let b_id = b.id();

    a.tick(&Transform::identity());
    assert!(a.heads().registry().contains(b_id));

    let pose = HeadTransformMessage {
        sender_id: b_id,
        position: Vector3F::new(1.0, 0.0, 0.0),
        rotation: Quaternion::IDENTITY,
    };
    hub.inject(a.transport().id(), TransportEvent::Message {
        kind: HeadTransformMessage::KIND,
        payload: pose.encode(),
    });
    a.tick(&Transform::identity());

    let entry = a.heads().registry().get(b_id).unwrap();
    assert_eq!(entry.proxy.local_transform.position, Vector3F::new(1.0, 0.0, 0.0));

    drop(b);
    a.tick(&Transform::identity());
    assert!(!a.heads().registry().contains(b_id));

    // A late pose from the departed participant brings it back
    hub.inject(a.transport().id(), TransportEvent::Message {
        kind: HeadTransformMessage::KIND,
        payload: pose.encode(),
    });
    a.tick(&Transform::identity());
    assert!(a.heads().registry().contains(b_id));
}

#[test]
fn test_presenter_followed_until_departure() {
    let hub = LoopbackHub::new();
    let mut a = host(&hub);
    let mut b = host(&hub);
    let b_id = b.transport().id();

    a.tick(&Transform::identity());
    b.tick(&Transform::identity());

    assert_eq!(b.announce_presenter(b_id), LookAtTarget::LocalViewpoint);
    let b_viewpoint = Transform::identity().with_position(Vector3F::new(0.0, 2.0, 0.0));
    b.tick(&b_viewpoint);
    a.tick(&Transform::identity());

    assert_eq!(a.heads().billboards()[0].target, LookAtTarget::RemoteHead(b_id));
    let targets = a.heads().billboard_targets(&Transform::identity());
    assert_eq!(targets[0].1.position, Vector3F::new(0.0, 2.0, 0.0));

    b.transport().disconnect();
    a.tick(&Transform::identity());

    let viewpoint = Transform::identity().with_position(Vector3F::new(3.0, 0.0, 0.0));
    let targets = a.heads().billboard_targets(&viewpoint);
    assert_eq!(targets[0].1, viewpoint);
}

#[test]
fn test_presenter_announcements_leave_registry_untouched() {
    let hub = LoopbackHub::new();
    let mut a = host(&hub);
    a.tick(&Transform::identity());
    let before = a.heads().registry().len();

    for presenter_id in 1000..1100 {
        let announcement = PresenterIdMessage { sender_id: 5, presenter_id };
        hub.inject(a.transport().id(), TransportEvent::Message {
            kind: PresenterIdMessage::KIND,
            payload: announcement.encode(),
        });
    }
    a.tick(&Transform::identity());

    assert_eq!(a.heads().registry().len(), before);
    assert_eq!(a.heads().billboards()[0].target, LookAtTarget::RemoteHead(1099));
}
