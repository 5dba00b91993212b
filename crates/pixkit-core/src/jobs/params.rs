use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{CHANNEL_SLOTS, DEFAULT_CONTAINER_NAME};
use crate::error::{PixkitError, Result};
use crate::offsets::ChannelOffset;

/// How the `ids` of a job are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    Image,
    Dataset,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "Image"),
            Self::Dataset => write!(f, "Dataset"),
        }
    }
}

/// One channel slot of the channel-offsets job. Slot N (1-based) controls
/// source channel N-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSlot {
    /// Include this channel in the output image.
    pub include: bool,
    /// Pixels to shift in x (negative shifts left).
    pub x_shift: i64,
    /// Pixels to shift in y (negative shifts up).
    pub y_shift: i64,
    /// Z-sections to shift by.
    pub z_shift: i64,
}

impl Default for ChannelSlot {
    fn default() -> Self {
        Self {
            include: true,
            x_shift: 0,
            y_shift: 0,
            z_shift: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelOffsetsParams {
    #[serde(default)]
    pub data_type: DataType,
    pub ids: Vec<u64>,
    /// Put the new images in a new dataset with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_dataset_name: Option<String>,
    #[serde(default = "default_slots")]
    pub channels: Vec<ChannelSlot>,
}

fn default_slots() -> Vec<ChannelSlot> {
    vec![ChannelSlot::default(); CHANNEL_SLOTS]
}

impl Default for ChannelOffsetsParams {
    fn default() -> Self {
        Self {
            data_type: DataType::Image,
            ids: Vec::new(),
            new_dataset_name: None,
            channels: default_slots(),
        }
    }
}

impl ChannelOffsetsParams {
    pub fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(PixkitError::InvalidParams("no IDs given".into()));
        }
        if self.channels.len() > CHANNEL_SLOTS {
            return Err(PixkitError::InvalidParams(format!(
                "at most {CHANNEL_SLOTS} channel slots are supported, got {}",
                self.channels.len()
            )));
        }
        Ok(())
    }

    /// Offsets of the included slots, in slot order.
    pub fn channel_offsets(&self) -> Vec<ChannelOffset> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.include)
            .map(|(index, slot)| ChannelOffset {
                index,
                x: slot.x_shift,
                y: slot.y_shift,
                z: slot.z_shift,
            })
            .collect()
    }

    pub fn new_dataset_name(&self) -> Option<&str> {
        non_blank(self.new_dataset_name.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagesFromRoisParams {
    #[serde(default)]
    pub data_type: DataType,
    pub ids: Vec<u64>,
    /// New dataset name in per-ROI mode, or the name suffix of each stack.
    #[serde(
        default = "default_container_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub container_name: Option<String>,
    /// Build one stack per image from all its ROIs instead of one image per ROI.
    #[serde(default)]
    pub make_image_stack: bool,
}

fn default_container_name() -> Option<String> {
    Some(DEFAULT_CONTAINER_NAME.to_string())
}

impl Default for ImagesFromRoisParams {
    fn default() -> Self {
        Self {
            data_type: DataType::Image,
            ids: Vec::new(),
            container_name: default_container_name(),
            make_image_stack: false,
        }
    }
}

impl ImagesFromRoisParams {
    pub fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(PixkitError::InvalidParams("no IDs given".into()));
        }
        Ok(())
    }

    pub fn container_name(&self) -> Option<&str> {
        non_blank(self.container_name.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Read job parameters from a TOML file.
pub fn load_params<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}
