//! Targeted cleaning of rooms and zones on a stored map.

use heapless::Vec;
use log::{info, warn};

use crate::app::commands::{Command, Region};
use crate::app::ports::TransportPort;
use crate::dispatcher::CommandDispatcher;
use crate::error::{Error, Result, TransportError};

/// Most regions accepted in one request.
pub const MAX_REGIONS: usize = 32;

/// A validated map/region selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSelection {
    map_id: Option<String>,
    regions: Vec<Region, MAX_REGIONS>,
}

impl RoomSelection {
    pub fn new(map_id: Option<String>, regions: &[Region]) -> Result<Self> {
        if regions.is_empty() {
            return Err(Error::InvalidCommandParameters("at least one region is required"));
        }
        if regions.iter().any(|r| r.region_id.trim().is_empty()) {
            return Err(Error::InvalidCommandParameters("region_id must not be empty"));
        }
        let regions = Vec::from_slice(regions)
            .map_err(|()| Error::InvalidCommandParameters("too many regions"))?;
        Ok(Self {
            map_id: map_id.filter(|id| !id.is_empty()),
            regions,
        })
    }

    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn to_command(&self) -> Command {
        Command::clean_rooms(self.map_id(), &self.regions)
    }
}

pub struct RoomCleaningService<'a, T: TransportPort> {
    dispatcher: CommandDispatcher<'a, T>,
}

impl<'a, T: TransportPort> RoomCleaningService<'a, T> {
    pub fn new(dispatcher: CommandDispatcher<'a, T>) -> Self {
        Self { dispatcher }
    }

    /// Validate the selection and send `clean_rooms`.  Nothing is sent when
    /// validation fails.
    pub fn clean_rooms(&self, map_id: Option<String>, regions: &[Region]) -> Result<()> {
        let selection = RoomSelection::new(map_id, regions)?;
        info!(
            "cleaning {} region(s) on map {}",
            selection.regions().len(),
            selection.map_id().unwrap_or("<current>")
        );
        match self.dispatcher.dispatch(selection.to_command()) {
            Err(Error::Transport(TransportError::Rejected(reason))) => {
                warn!("robot rejected region selection: {}", reason);
                Err(Error::RegionValidationFailure(reason))
            }
            other => other,
        }
    }
}
