//! A small demo world for manual play and integration tests.

use mudlark_engine::{EntityId, Zone};

use crate::{Admin, Bird, Colorful, Dark, Important, Positioned, StickyBlob, Wandering};

/// Builds the demo world and returns the id of a hearing admin player
/// standing in the courtyard.
pub fn bootstrap(zone: &mut Zone) -> EntityId {
    let courtyard = zone.spawn(
        "a dusty courtyard",
        "Cracked flagstones stretch between weathered walls.",
    );
    zone.attach(courtyard, Box::new(Positioned::new().container()));

    let shed = zone.spawn("a garden shed", "It smells of oil and cut grass.");
    zone.attach(shed, Box::new(Positioned::new().container()));
    zone.attach(shed, Box::new(Dark::default()));
    Positioned::link(zone, courtyard, "north", shed, Some("south"));

    let ball = zone.spawn("a rubber ball", "A round rubber ball.");
    zone.attach(ball, Box::new(Positioned::new().carriable().inside(courtyard)));
    zone.attach(ball, Box::new(Colorful::new("red")));

    let blob = zone.spawn("a sticky blob", "It glistens unpleasantly.");
    zone.attach(blob, Box::new(Positioned::new().carriable().inside(courtyard)));
    zone.attach(blob, Box::new(StickyBlob::default()));

    let amulet = zone.spawn("an ancient amulet", "It hums with quiet purpose.");
    zone.attach(
        amulet,
        Box::new(Positioned::new().carriable().inside(courtyard)),
    );
    zone.attach(amulet, Box::new(Important::default()));

    let pigeon = zone.spawn("a scruffy pigeon", "It eyes you sideways.");
    zone.attach(pigeon, Box::new(Positioned::new().inside(courtyard)));
    zone.attach(pigeon, Box::new(Bird::default()));
    zone.attach(
        pigeon,
        Box::new(Wandering::new(0.02, vec![courtyard, shed])),
    );

    let player = create_player(zone, "Player", courtyard);
    zone.attach(player, Box::new(Admin::default()));
    player
}

/// Creates a hearing, carrying-capable player inside the given container.
pub fn create_player(zone: &mut Zone, name: &str, container: EntityId) -> EntityId {
    let player = zone.spawn(name, "A fellow player.");
    if let Some(entity) = zone.entity_mut(player) {
        entity.hearing = true;
    }
    zone.attach(player, Box::new(Positioned::new().container().inside(container)));
    player
}
