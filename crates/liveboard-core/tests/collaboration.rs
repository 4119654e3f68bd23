//! Several connections editing one board.

use kurbo::Point;
use liveboard_core::{
    CanvasConfig, CanvasController, CanvasEvent, Color, ConnectionId, LayerKind, LayerPatch,
    PresenceOptions, PresenceUpdate, Room, Tool, connection_id_to_color,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn controller(name: &str) -> CanvasController {
    CanvasController::new(ConnectionId::from(name), CanvasConfig::default())
}

/// Deliver pending document updates and presence messages from `from` to `to`.
fn sync(from: &mut CanvasController, to: &mut CanvasController) {
    let from = from.room_mut();
    let to = to.room_mut();
    if let Some(bytes) = from.take_document_updates().unwrap() {
        to.reconcile(&bytes).unwrap();
    }
    for message in from.take_presence_messages() {
        to.handle_presence_message(&message);
    }
}

fn sync_both(a: &mut CanvasController, b: &mut CanvasController) {
    sync(a, b);
    sync(b, a);
}

#[test]
fn inserted_layers_reach_every_connection() {
    init_logging();
    let mut alice = controller("alice");
    let mut bob = controller("bob");

    alice.select_tool(Tool::Insert(LayerKind::Rectangle));
    alice.pointer_up(Point::new(10.0, 10.0)).unwrap();
    bob.select_tool(Tool::Insert(LayerKind::Ellipse));
    bob.pointer_up(Point::new(300.0, 300.0)).unwrap();

    sync_both(&mut alice, &mut bob);

    assert_eq!(alice.layers_ordered().len(), 2);
    assert_eq!(alice.layers_ordered(), bob.layers_ordered());
}

#[test]
fn concurrent_edits_to_different_layers_both_survive() {
    init_logging();
    let mut alice = controller("alice");
    let mut bob = controller("bob");
    let a = alice
        .room_mut()
        .insert_layer(LayerKind::Rectangle, Point::ZERO, Color::white())
        .unwrap();
    let b = alice
        .room_mut()
        .insert_layer(LayerKind::Note, Point::new(200.0, 0.0), Color::white())
        .unwrap();
    sync(&mut alice, &mut bob);

    alice
        .room_mut()
        .update_layer_fields(&a, LayerPatch::fill(Color::black()))
        .unwrap();
    bob.room_mut()
        .update_layer_fields(&b, LayerPatch::position(Point::new(250.0, 50.0)))
        .unwrap();
    sync_both(&mut alice, &mut bob);

    for controller in [&alice, &bob] {
        let document = controller.room().document();
        assert_eq!(document.layer(&a).unwrap().fill, Color::black());
        let moved = document.layer(&b).unwrap();
        assert_eq!((moved.x, moved.y), (250.0, 50.0));
    }
}

#[test]
fn remote_drag_is_visible_and_undo_stays_local() {
    init_logging();
    let mut alice = controller("alice");
    let mut bob = controller("bob");
    let id = alice
        .room_mut()
        .insert_layer(LayerKind::Rectangle, Point::ZERO, Color::white())
        .unwrap();
    sync(&mut alice, &mut bob);

    bob.handle_event(CanvasEvent::LayerPointerDown {
        layer_id: id.clone(),
        position: Point::new(50.0, 50.0),
    })
    .unwrap();
    bob.handle_event(CanvasEvent::PointerMove { position: Point::new(80.0, 60.0) })
        .unwrap();
    bob.handle_event(CanvasEvent::PointerUp { position: Point::new(80.0, 60.0) })
        .unwrap();
    sync_both(&mut alice, &mut bob);

    let layer = alice.room().document().layer(&id).unwrap();
    assert_eq!((layer.x, layer.y), (30.0, 10.0));
    assert_eq!(
        alice.layer_selection_colors().get(&id),
        Some(&connection_id_to_color("bob"))
    );

    // Alice's history only holds her insert; undoing it deletes the layer.
    assert_eq!(alice.room().history().undo_len(), 1);
    bob.undo().unwrap();
    sync_both(&mut alice, &mut bob);
    let layer = alice.room().document().layer(&id).unwrap();
    assert_eq!((layer.x, layer.y), (0.0, 0.0));
    assert!(alice.layer_selection_colors().is_empty());
}

#[test]
fn presence_cursor_and_leave_propagate() {
    init_logging();
    let mut alice = controller("alice");
    let mut bob = controller("bob");

    alice.pointer_move(Point::new(12.0, 34.0)).unwrap();
    sync(&mut alice, &mut bob);
    let others = bob.room().presence().others_presence();
    assert_eq!(
        others[&ConnectionId::from("alice")].cursor,
        Some(Point::new(12.0, 34.0))
    );

    alice.room_mut().leave();
    sync(&mut alice, &mut bob);
    assert!(bob.room().presence().others_presence().is_empty());
}

#[test]
fn late_joiner_starts_from_snapshot() {
    init_logging();
    let config = CanvasConfig::default();
    let mut alice = Room::new(ConnectionId::from("alice"), &config);
    for i in 0..3 {
        alice
            .insert_layer(LayerKind::Text, Point::new(i as f64 * 10.0, 0.0), Color::white())
            .unwrap();
    }
    alice.set_my_presence(
        PresenceUpdate::selection(alice.document().layer_ids()),
        PresenceOptions::default(),
    );

    let snapshot = alice.export_snapshot().unwrap();
    let carol = Room::from_snapshot(&snapshot, ConnectionId::from("carol"), &config).unwrap();
    assert_eq!(carol.document().layers_ordered(), alice.document().layers_ordered());
    assert!(!carol.can_undo());
}

#[test]
fn layer_limit_holds_across_connections() {
    init_logging();
    let config = CanvasConfig {
        max_layers: 3,
        ..CanvasConfig::default()
    };
    let mut alice = CanvasController::new(ConnectionId::from("alice"), config.clone());
    let mut bob = CanvasController::new(ConnectionId::from("bob"), config);

    for _ in 0..2 {
        alice.select_tool(Tool::Insert(LayerKind::Rectangle));
        alice.pointer_up(Point::ZERO).unwrap();
    }
    sync(&mut alice, &mut bob);

    for _ in 0..2 {
        bob.select_tool(Tool::Insert(LayerKind::Rectangle));
        bob.pointer_up(Point::ZERO).unwrap();
    }
    assert_eq!(bob.room().document().layer_count(), 3);
}
