// Cross-cutting prompt fragments. Task prompts live next to the code that sends them
// (see analysis/prompts.rs).

/// Appended to every task prompt so the model stays inside the supplied text.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Never invent employers, dates, degrees, metrics, or contact details. \
    If a field is missing from the source text, use an empty string \
    (or null for linkedin and portfolio).";
