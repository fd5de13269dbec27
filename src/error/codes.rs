/// Error code registry for stepmaker
///
/// Error codes are organized by category:
/// - 1000-1999: Step description errors
/// - 2000-2999: Modifier compatibility and ordering errors
/// - 3000-3999: Registry errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Step description errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_INVALID_DESCRIPTION: u16 = 1001;
    pub const CONFIG_UNKNOWN_ITEM: u16 = 1002;
    pub const CONFIG_MULTIPLE_ACTIONS: u16 = 1003;
    pub const CONFIG_NO_ACTION: u16 = 1004;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_INVALID_METADATA: u16 = 1006;

    // Modifier errors (2000-2999)
    pub const MODIFIER_GENERIC: u16 = 2000;
    pub const MODIFIER_INCOMPATIBLE: u16 = 2001;
    pub const MODIFIER_PROHIBITED: u16 = 2002;
    pub const MODIFIER_REQUIRED: u16 = 2003;
    pub const MODIFIER_ORDER_CYCLE: u16 = 2004;

    // Registry errors (3000-3999)
    pub const REGISTRY_GENERIC: u16 = 3000;
    pub const REGISTRY_NAMESPACE_CONFLICT: u16 = 3001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Step description errors
        1000 => "Generic step configuration error",
        1001 => "Step description is neither a name nor a mapping",
        1002 => "Unknown action or modifier",
        1003 => "More than one action specified in a step",
        1004 => "No action specified in a step",
        1005 => "Invalid action or modifier configuration",
        1006 => "Invalid step metadata",

        // Modifier errors
        2000 => "Generic modifier error",
        2001 => "Modifier cannot be used with the action",
        2002 => "Modifier used together with a prohibited modifier",
        2003 => "Modifier used without a required modifier",
        2004 => "Modifier ordering hints form a cycle",

        // Registry errors
        3000 => "Generic registry error",
        3001 => "Action and modifier namespaces must be distinct",

        _ => "Unknown error code",
    }
}
