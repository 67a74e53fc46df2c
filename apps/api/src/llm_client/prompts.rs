// Cross-cutting prompt fragments shared by every prompt sent through the client.
// Feature prompts live next to the feature (see roadmap/prompts.rs).

/// Opening instruction that asks for bare JSON output.
pub const JSON_ONLY_INSTRUCTION: &str =
    "The response should be valid JSON without any markdown or additional text.";
