//! Error types for configuration parsing and lookup.

use thiserror::Error;

/// Error type for configuration operations.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (channel, connection).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Channel not present in the configuration.
    #[error("channel {channel} not found in configuration")]
    ChannelNotFound {
        /// Channel identifier.
        channel: u32,
    },

    /// Connection not present under its channel.
    #[error("connection '{connection}' not found for channel {channel}")]
    ConnectionNotFound {
        /// Channel identifier.
        channel: u32,
        /// Connection identifier.
        connection: String,
    },

    /// Connection lacks a required field.
    #[error("connection '{connection}' has no <{field}>")]
    MissingField {
        /// Connection identifier.
        connection: String,
        /// Field element name.
        field: String,
    },

    /// Connection field could not be parsed.
    #[error("invalid <{field}> '{value}' on connection '{connection}'")]
    InvalidField {
        /// Connection identifier.
        connection: String,
        /// Field element name.
        field: String,
        /// Invalid value.
        value: String,
    },

    /// Invalid channel list.
    #[error("invalid channel list '{input}': {message}")]
    InvalidChannelList {
        /// Raw input.
        input: String,
        /// Error message.
        message: String,
    },

    /// Invalid document structure.
    #[error("invalid configuration structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(connection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            connection: connection.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(
        connection: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            connection: connection.into(),
            field: field.into(),
            value: value.into(),
        }
    }
}
