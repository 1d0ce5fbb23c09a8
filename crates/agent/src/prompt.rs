//! Prompt text for structured decisions.
//!
//! The persona's own instruction comes first; when capabilities are
//! available it is followed by the list of tools and the JSON response
//! format the decision parser expects.

use parley_core::capability::CapabilityDescriptor;

use crate::decision::FINAL_ANSWER_ACTION;

/// Full system instruction for a turn.
pub fn system_instruction(persona_prompt: &str, capabilities: &[CapabilityDescriptor]) -> String {
    let persona_prompt = persona_prompt.trim();
    if capabilities.is_empty() {
        return persona_prompt.to_string();
    }
    format!("{persona_prompt}\n\n{}", capability_guidance(capabilities))
}

/// Tool list plus response-format instructions.
pub fn capability_guidance(capabilities: &[CapabilityDescriptor]) -> String {
    let tools: String = capabilities
        .iter()
        .map(|c| format!("> {}: {}\n", c.name, c.description))
        .collect();
    let names = capabilities
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "TOOLS\n\
         ------\n\
         You can use tools to look up information that may help answer the user's question. \
         The available tools are:\n\n\
         {tools}\n\
         RESPONSE FORMAT INSTRUCTIONS\n\
         ----------------------------\n\n\
         Always respond with a markdown code snippet containing a single JSON blob, in one of two formats.\n\n\
         **Option 1:** use a tool.\n\n\
         ```json\n\
         {{\n    \"action\": string, \\ The action to take. Must be one of {names}\n    \"action_input\": string \\ The input to the action\n}}\n\
         ```\n\n\
         **Option 2:** respond directly to the user.\n\n\
         ```json\n\
         {{\n    \"action\": \"{FINAL_ANSWER_ACTION}\",\n    \"action_input\": string \\ Your reply to the user\n}}\n\
         ```"
    )
}

/// Wraps the user's utterance with a format reminder.
pub fn user_input(utterance: &str) -> String {
    format!(
        "USER'S INPUT\n\
         --------------------\n\
         Here is the user's input (remember to respond with a markdown code snippet of a json blob with a single action, and NOTHING else):\n\n\
         {utterance}"
    )
}

/// Relays a capability's output back to the model.
pub fn observation(output: &str) -> String {
    format!(
        "TOOL RESPONSE:\n\
         ---------------------\n\
         {output}\n\n\
         USER'S INPUT\n\
         --------------------\n\n\
         Okay, so what is the response to my last comment? If using information obtained from the tools \
         you must mention it explicitly without mentioning the tool names. Remember to respond with a \
         markdown code snippet of a json blob with a single action, and NOTHING else."
    )
}

/// Asks the model to restate an unparseable reply.
pub fn format_correction(reason: &str) -> String {
    format!(
        "Your last reply could not be understood ({reason}). Respond again with a markdown code \
         snippet of a json blob with a single action, and NOTHING else. Use \"{FINAL_ANSWER_ACTION}\" \
         as the action to reply to the user directly."
    )
}
