//! Prompt construction for tier generation

use tierproof_domain::{GenerationRequest, Tier};

/// Builds the prompt a completion back end receives for one tier attempt
pub struct PromptBuilder<'a> {
    request: &'a GenerationRequest,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for a generation request
    pub fn new(request: &'a GenerationRequest) -> Self {
        Self { request }
    }

    /// Build the complete generation prompt
    pub fn build(&self) -> String {
        let request = self.request;
        let context = &request.context;
        let mut prompt = String::new();

        // 1. Role and length contract
        prompt.push_str(&format!(
            "Write the {} summary of {} ({}).\n",
            request.tier, context.unit_name, context.unit_id
        ));
        prompt.push_str(&format!(
            "Length: between {} and {} words. {}\n\n",
            request.word_range.min,
            request.word_range.max,
            tier_guidance(request.tier)
        ));

        // 2. Grounding rules
        prompt.push_str(GROUNDING_RULES);
        prompt.push_str("\n\n");

        // 3. Source data
        prompt.push_str("Source data:\n---\n");
        prompt.push_str(&context.render());
        prompt.push_str("---\n\n");

        // 4. Corrections from earlier attempts, oldest first
        if !request.corrections.is_empty() {
            prompt.push_str("Your previous attempts were rejected. Apply every correction below:\n");
            for (i, correction) in request.corrections.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, correction));
            }
            prompt.push('\n');
        }

        prompt.push_str(OUTPUT_REMINDER);
        prompt
    }
}

fn tier_guidance(tier: Tier) -> &'static str {
    match tier {
        Tier::Brief => "A single sentence naming the most important fact.",
        Tier::Medium => "One paragraph covering results, analyst views and recent events.",
        Tier::Expanded => "Several paragraphs; cover every provider's material facts.",
    }
}

const GROUNDING_RULES: &str = r#"Rules:
- Use only facts present in the source data
- Quote figures, dates and names exactly as the sources state them
- Do not forecast, speculate or add outside knowledge
- If a fact is uncertain in the sources, say so plainly"#;

const OUTPUT_REMINDER: &str = "Respond with the summary text only: no headings, no markdown, no preamble.";

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_domain::{AssembledContext, WordRange};

    fn request(corrections: Vec<String>) -> GenerationRequest {
        GenerationRequest {
            tier: Tier::Medium,
            context: AssembledContext {
                tier: Tier::Medium,
                unit_id: "TICK".to_string(),
                unit_name: "Tick Corp".to_string(),
                excerpts: Vec::new(),
                passages: Vec::new(),
                truncated: false,
            },
            corrections,
            word_range: WordRange::new(75, 150),
            attempt: 1,
        }
    }

    #[test]
    fn test_prompt_includes_tier_and_range() {
        let req = request(Vec::new());
        let prompt = PromptBuilder::new(&req).build();
        assert!(prompt.contains("medium summary of Tick Corp (TICK)"));
        assert!(prompt.contains("between 75 and 150 words"));
        assert!(!prompt.contains("previous attempts"));
    }

    #[test]
    fn test_prompt_lists_every_correction_in_order() {
        let req = request(vec!["first fix".to_string(), "second fix".to_string()]);
        let prompt = PromptBuilder::new(&req).build();
        let first = prompt.find("1. first fix").unwrap();
        let second = prompt.find("2. second fix").unwrap();
        assert!(first < second);
    }
}
