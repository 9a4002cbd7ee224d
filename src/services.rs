//! Services
//!
//! Stable identifiers for every sellable line item, and the dictionary that
//! maps the human-readable names used on the marketing site to them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable internal identifier for a sellable service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceId {
    /// HDR still photography
    HdrPhotography,

    /// Aerial stills taken by drone
    DroneAerialPhotos,

    /// Aerial video taken by drone
    DroneAerialVideo,

    /// Matterport 3D walkthrough
    MatterportTour,

    /// Edited cinematic property video
    CinematicVideo,

    /// Vertical short-form video
    SocialMediaReel,

    /// 2D floor plan
    FloorPlan,

    /// Virtually staged room, priced per image
    VirtualStaging,

    /// On-site dusk photography
    TwilightPhotography,

    /// Day-to-dusk edit, priced per image
    VirtualTwilight,

    /// Object removal edit, priced per image
    ItemRemoval,

    /// Short on-camera agent introduction
    AgentIntroVideo,
}

impl ServiceId {
    /// Every catalogued service, in price-table order.
    pub const ALL: [ServiceId; 12] = [
        ServiceId::HdrPhotography,
        ServiceId::DroneAerialPhotos,
        ServiceId::DroneAerialVideo,
        ServiceId::MatterportTour,
        ServiceId::CinematicVideo,
        ServiceId::SocialMediaReel,
        ServiceId::FloorPlan,
        ServiceId::TwilightPhotography,
        ServiceId::AgentIntroVideo,
        ServiceId::VirtualStaging,
        ServiceId::VirtualTwilight,
        ServiceId::ItemRemoval,
    ];

    /// The identifier as it appears in JSON payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceId::HdrPhotography => "hdrPhotography",
            ServiceId::DroneAerialPhotos => "droneAerialPhotos",
            ServiceId::DroneAerialVideo => "droneAerialVideo",
            ServiceId::MatterportTour => "matterportTour",
            ServiceId::CinematicVideo => "cinematicVideo",
            ServiceId::SocialMediaReel => "socialMediaReel",
            ServiceId::FloorPlan => "floorPlan",
            ServiceId::VirtualStaging => "virtualStaging",
            ServiceId::TwilightPhotography => "twilightPhotography",
            ServiceId::VirtualTwilight => "virtualTwilight",
            ServiceId::ItemRemoval => "itemRemoval",
            ServiceId::AgentIntroVideo => "agentIntroVideo",
        }
    }

    /// Customer-facing name used in emails and quotes.
    pub const fn display_name(self) -> &'static str {
        match self {
            ServiceId::HdrPhotography => "HDR Photography",
            ServiceId::DroneAerialPhotos => "Drone Aerial Photos",
            ServiceId::DroneAerialVideo => "Drone Aerial Video",
            ServiceId::MatterportTour => "Matterport 3D Tour",
            ServiceId::CinematicVideo => "Cinematic Video",
            ServiceId::SocialMediaReel => "Social Media Reel",
            ServiceId::FloorPlan => "2D Floor Plan",
            ServiceId::VirtualStaging => "Virtual Staging",
            ServiceId::TwilightPhotography => "Twilight Photography",
            ServiceId::VirtualTwilight => "Virtual Twilight",
            ServiceId::ItemRemoval => "Item Removal",
            ServiceId::AgentIntroVideo => "Agent Intro Video",
        }
    }

    /// Parse a JSON identifier (`hdrPhotography`).
    pub fn from_id(id: &str) -> Option<Self> {
        ServiceId::ALL.into_iter().find(|service| service.as_str() == id)
    }

    /// Map a service name from a price table row to its identifier.
    ///
    /// Case and punctuation are ignored, so `"HDR Photos"`, `"hdr photography"`
    /// and `"HDR-Photography"` all resolve.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let service = match key.as_str() {
            "hdrphotography" | "hdrphotos" | "photography" | "photos" => ServiceId::HdrPhotography,
            "droneaerialphotos" | "dronephotos" | "aerialphotos" | "dronephotography" => {
                ServiceId::DroneAerialPhotos
            }
            "droneaerialvideo" | "dronevideo" | "aerialvideo" => ServiceId::DroneAerialVideo,
            "matterport3dtour" | "matterporttour" | "3dtour" | "matterport" => {
                ServiceId::MatterportTour
            }
            "cinematicvideo" | "propertyvideo" => ServiceId::CinematicVideo,
            "socialmediareel" | "reel" | "socialreel" => ServiceId::SocialMediaReel,
            "2dfloorplan" | "floorplan" | "floorplans" => ServiceId::FloorPlan,
            "virtualstaging" => ServiceId::VirtualStaging,
            "twilightphotography" | "twilightphotos" | "twilight" => {
                ServiceId::TwilightPhotography
            }
            "virtualtwilight" => ServiceId::VirtualTwilight,
            "itemremoval" | "objectremoval" => ServiceId::ItemRemoval,
            "agentintrovideo" | "agentintro" => ServiceId::AgentIntroVideo,
            _ => return None,
        };

        Some(service)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
