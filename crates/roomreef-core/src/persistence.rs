//! Save/Load functionality for persisting session state
//!
//! Uses bincode for compact binary serialization of the whole session.
//! Components are serialized individually then reconstructed on load.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::round::Round;
use crate::state::BoundaryState;
use crate::timers::TimerQueue;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the session state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Simulation time in seconds
    pub sim_time: f64,
    /// Whether the current population has been spawned
    pub spawned: bool,
    /// Room boundary as of the last completed scan
    pub boundary: BoundaryState,
    /// Round scoring state
    pub round: Round,
    /// Pending sim-clock timers
    pub timers: TimerQueue,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    pub position: Option<Position>,
    pub heading: Option<Heading>,
    pub fish: Option<Fish>,
    pub swim: Option<Swim>,
    pub caught: Option<Caught>,
    pub grabbed: Option<Grabbed>,
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity in world.iter() {
        let mut se = SerializableEntity::default();
        let entity_ref = world.entity(entity.entity()).unwrap();

        if let Some(c) = entity_ref.get::<&Position>() {
            se.position = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Heading>() {
            se.heading = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Fish>() {
            se.fish = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Swim>() {
            se.swim = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Caught>() {
            se.caught = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Grabbed>() {
            se.grabbed = Some(*c);
        }

        entities.push(se);
    }

    entities
}

/// Rebuild a world from serialized entities
fn deserialize_entities(world: &mut World, entities: Vec<SerializableEntity>) {
    for se in entities {
        spawn_entity(world, se);
    }
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.position {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.heading {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.fish {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.swim {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.caught {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.grabbed {
        let _ = world.insert_one(entity, c);
    }
}

/// Save the complete session to a writer
pub fn save_session<W: Write>(
    writer: W,
    world: &World,
    sim_time: f64,
    spawned: bool,
    boundary: &BoundaryState,
    round: &Round,
    timers: &TimerQueue,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        spawned,
        boundary: boundary.clone(),
        round: round.clone(),
        timers: timers.clone(),
        entities: serialize_entities(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a session from a reader
pub fn load_session<R: Read>(reader: R) -> Result<LoadedSession, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    deserialize_entities(&mut world, save_data.entities);

    Ok(LoadedSession {
        world,
        sim_time: save_data.sim_time,
        spawned: save_data.spawned,
        boundary: save_data.boundary,
        round: save_data.round,
        timers: save_data.timers,
    })
}

/// Result of loading a session
pub struct LoadedSession {
    pub world: World,
    pub sim_time: f64,
    pub spawned: bool,
    pub boundary: BoundaryState,
    pub round: Round,
    pub timers: TimerQueue,
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RoomSession;

    #[test]
    fn test_save_load_roundtrip() {
        // Drive a session past the fallback so a population exists
        let mut session = RoomSession::new();
        for _ in 0..50 {
            session.update(0.5);
        }
        assert!(session.scanned());
        let original_time = session.sim_time;
        let original_fish = session.live_fish();
        assert!(original_fish > 0);

        let mut save_buffer = Vec::new();
        session.save(&mut save_buffer).expect("Save failed");

        println!("Save size: {} bytes", save_buffer.len());

        let mut loaded = RoomSession::new();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert!((loaded.sim_time - original_time).abs() < 0.001);
        assert_eq!(loaded.live_fish(), original_fish);
        assert!(loaded.scanned());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut session = RoomSession::new();
        for _ in 0..50 {
            session.update(0.5);
        }
        let mut save_buffer = Vec::new();
        session.save(&mut save_buffer).expect("Save failed");

        // The version field is the first u32 in the stream
        save_buffer[0] = 99;
        match load_session(&save_buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 99);
            }
            Ok(_) => panic!("Expected VersionMismatch, got Ok"),
            Err(other) => panic!("Expected VersionMismatch, got {}", other),
        }
    }
}
