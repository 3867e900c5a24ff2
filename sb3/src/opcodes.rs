//! Opcode families the analyses care about.

/// Hat opcodes: blocks that can start a script without a preceding block.
pub const HAT_OPCODES: &[&str] = &[
    "event_whenflagclicked",
    "event_whenkeypressed",
    "event_whenthisspriteclicked",
    "event_whenstageclicked",
    "event_whenbackdropswitchesto",
    "event_whengreaterthan",
    "event_whenbroadcastreceived",
    "control_start_as_clone",
];

/// Custom-procedure definition hat.
pub const PROCEDURES_DEFINITION: &str = "procedures_definition";

/// Custom-procedure prototype (shadow block carried by the definition hat).
pub const PROCEDURES_PROTOTYPE: &str = "procedures_prototype";

/// True if a block with this opcode may root a script: an event hat,
/// the clone hat, or a custom-procedure definition.
pub fn is_trigger(opcode: &str) -> bool {
    opcode == PROCEDURES_DEFINITION || HAT_OPCODES.contains(&opcode)
}
