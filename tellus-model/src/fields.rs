//! Field names, wire keys and kind tags.
//!
//! Records address their well-known fields by internal name. The codec
//! translates internal names to the compact wire keys through the type
//! registry; [`STANDARD_FIELDS`] is the mapping every registry starts with.

/// Internal names of the well-known fields.
pub mod field {
    pub const ENTITY_ID: &str = "entity_id";
    pub const TIMESTAMP: &str = "timestamp";
    pub const PARENT_ID: &str = "parent_id";
    pub const REPORTING_NODE: &str = "reporting_node";
    pub const EXECUTION_CONTEXT: &str = "execution_context";
    pub const MESSAGE: &str = "message";
    pub const DURATION: &str = "duration";
    pub const OPERATION_NAME: &str = "operation_name";
    pub const STATUS: &str = "status";
    pub const SUBTYPE: &str = "subtype";
    pub const RESOURCE_ID: &str = "resource_id";
    pub const PARAMETERS: &str = "parameters";
}

/// Reserved keys of the wire format.
pub mod wire {
    /// Type discriminator present on every encoded object.
    pub const TYPE: &str = "a_type";
    /// Array holding the children of a container.
    pub const CHILD: &str = "child";
    /// Prefix of an extension key written verbatim because its plain key
    /// is reserved or already taken by a well-known field.
    pub const ESCAPE: &str = "~";

    pub const ENTITY_ID: &str = "a_entityid";
    pub const TIMESTAMP: &str = "a_timestamp";
    pub const PARENT_ID: &str = "a_parentid";
    pub const REPORTING_NODE: &str = "a_node";
    pub const EXECUTION_CONTEXT: &str = "a_exectx";
    pub const MESSAGE: &str = "a_msg";
    pub const DURATION: &str = "a_execns";
    pub const OPERATION_NAME: &str = "a_operation";
    pub const STATUS: &str = "a_status";
    pub const SUBTYPE: &str = "a_subtype";
    pub const RESOURCE_ID: &str = "a_resourceid";
    pub const PARAMETERS: &str = "a_params";
}

/// Wire tags of the built-in kinds.
pub mod tag {
    pub const SESSION: &str = "SE";
    pub const TRANSACTION: &str = "TR";
    pub const EVENT: &str = "EV";
    pub const STATE: &str = "ST";
}

/// Namespace the built-in kinds are registered under.
pub const CORE_NAMESPACE: &str = "tellus";

/// Internal name → wire key for every well-known field.
pub const STANDARD_FIELDS: [(&str, &str); 12] = [
    (field::ENTITY_ID, wire::ENTITY_ID),
    (field::TIMESTAMP, wire::TIMESTAMP),
    (field::PARENT_ID, wire::PARENT_ID),
    (field::REPORTING_NODE, wire::REPORTING_NODE),
    (field::EXECUTION_CONTEXT, wire::EXECUTION_CONTEXT),
    (field::MESSAGE, wire::MESSAGE),
    (field::DURATION, wire::DURATION),
    (field::OPERATION_NAME, wire::OPERATION_NAME),
    (field::STATUS, wire::STATUS),
    (field::SUBTYPE, wire::SUBTYPE),
    (field::RESOURCE_ID, wire::RESOURCE_ID),
    (field::PARAMETERS, wire::PARAMETERS),
];
