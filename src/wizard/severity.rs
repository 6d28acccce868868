//! Display mapping from backend category labels to colors and icons.
//!
//! Labels are matched case-insensitively. Anything unrecognized maps to the
//! neutral grey and a generic icon rather than failing.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

pub const RED: Color = Color::from_hex(0xdc2626);
pub const ORANGE: Color = Color::from_hex(0xea580c);
pub const AMBER: Color = Color::from_hex(0xf59e0b);
pub const GREEN: Color = Color::from_hex(0x10b981);
pub const BLUE: Color = Color::from_hex(0x3b82f6);
pub const GREY: Color = Color::from_hex(0x6b7280);

/// Banner palette for the symptom result: emergency vs. non-emergency.
pub fn emergency_banner(emergency: bool) -> Color {
    if emergency {
        Color::from_hex(0x991b1b)
    } else {
        Color::from_hex(0x166534)
    }
}

/// Urgency of a symptom analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Emergency,
    Urgent,
    Moderate,
    Low,
    Unknown,
}

impl Urgency {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "emergency" => Urgency::Emergency,
            "urgent" => Urgency::Urgent,
            "moderate" => Urgency::Moderate,
            "low" => Urgency::Low,
            _ => Urgency::Unknown,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Urgency::Emergency => RED,
            Urgency::Urgent => ORANGE,
            Urgency::Moderate => AMBER,
            Urgency::Low => GREEN,
            Urgency::Unknown => GREY,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Urgency::Emergency => "🚨",
            Urgency::Urgent => "⚠️",
            Urgency::Moderate => "⏰",
            Urgency::Low => "✅",
            Urgency::Unknown => "ℹ️",
        }
    }
}

/// Severity of a single drug-drug interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionSeverity {
    Contraindicated,
    Major,
    Moderate,
    Minor,
    Unknown,
}

impl InteractionSeverity {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "contraindicated" => InteractionSeverity::Contraindicated,
            "major" => InteractionSeverity::Major,
            "moderate" => InteractionSeverity::Moderate,
            "minor" => InteractionSeverity::Minor,
            _ => InteractionSeverity::Unknown,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            InteractionSeverity::Contraindicated => RED,
            InteractionSeverity::Major => ORANGE,
            InteractionSeverity::Moderate => AMBER,
            InteractionSeverity::Minor => GREEN,
            InteractionSeverity::Unknown => GREY,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            InteractionSeverity::Contraindicated => "🚫",
            InteractionSeverity::Major => "⚠️",
            InteractionSeverity::Moderate => "⚡",
            InteractionSeverity::Minor => "ℹ️",
            InteractionSeverity::Unknown => "💊",
        }
    }
}

/// Overall risk of a medication combination. Color only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallRisk {
    Dangerous,
    Caution,
    Monitor,
    Safe,
    Unknown,
}

impl OverallRisk {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "dangerous" => OverallRisk::Dangerous,
            "caution" => OverallRisk::Caution,
            "monitor" => OverallRisk::Monitor,
            "safe" => OverallRisk::Safe,
            _ => OverallRisk::Unknown,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            OverallRisk::Dangerous => RED,
            OverallRisk::Caution => ORANGE,
            OverallRisk::Monitor => AMBER,
            OverallRisk::Safe => GREEN,
            OverallRisk::Unknown => GREY,
        }
    }
}

/// Status of one interpreted lab value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabStatus {
    Critical,
    High,
    Low,
    Normal,
    Unknown,
}

impl LabStatus {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => LabStatus::Critical,
            "high" => LabStatus::High,
            "low" => LabStatus::Low,
            "normal" => LabStatus::Normal,
            _ => LabStatus::Unknown,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            LabStatus::Critical => RED,
            LabStatus::High => ORANGE,
            LabStatus::Low => BLUE,
            LabStatus::Normal => GREEN,
            LabStatus::Unknown => GREY,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LabStatus::Critical => "🚨",
            LabStatus::High => "🔴",
            LabStatus::Low => "🔵",
            LabStatus::Normal => "✅",
            LabStatus::Unknown => "📊",
        }
    }
}
