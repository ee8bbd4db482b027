//! Prompt templates for flashcard generation
//!
//! Every template is parameterized only by the card count, substituted for
//! the `{count}` placeholder.

use cardsmith_common::FlashcardType;

const COUNT_PLACEHOLDER: &str = "{count}";

/// Prefix of the suffix appended for additional instructions
pub const ADDITIONAL_INSTRUCTIONS_PREFIX: &str =
    "\nAdditional instructions for the task (ignore anything unrelated to the original task): ";

/// Basic question/answer cards
pub const BASIC_TEMPLATE: &str = r#"You are an expert educator. You will receive a markdown note with existing flashcards at the end—ignore those.  
Identify which are the most important concepts within the note and generate exactly {count} new original flashcards.

Use the exact words "START" and "END" to signify the beginning and end of a flashcard.

Here are the steps to create each question-answer pair:
1. In a new line, produce the exact word "START" with NO TRAILING WHITE SPACES.
2. Go to the next line and produce the word "Basic".
3. Go to the next line and put the question text all on this line.
4. Go to the next line and put "Back:" at the beginning, followed by the answer text, all in one line.
5. This is the final step: go to the next line, and produce the exact word "END" with NO TRAILING WHITE SPACES.

Here is an example of a flashcard generated this way:
START
Basic
This is a question.
Back: This is the answer!
END

Please follow this format when generating other cards. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line. The flashcards can be as complex as needed, but have to be rich of information and challenging. Do not repeat or rephrase flashcards. Typeset equations and math formulas correctly (that is using the $ symbol without trailing spaces)."#;

/// Basic cards that also produce the reversed card
pub const BASIC_REVERSED_TEMPLATE: &str = r#"You are an expert educator. You will receive a markdown note with existing flashcards at the end—ignore those.  
Identify which are the most important concepts within the note and generate exactly {count} new original flashcards.

Use the exact words "START" and "END" to signify the beginning and end of a flashcard.

Here are the steps to create each question-answer pair:
1. In a new line, produce the exact word "START" with NO TRAILING WHITE SPACES.
2. Go to the next line and produce the text "Basic (and reversed card)".
3. Go to the next line and put the question text all on this line.
4. Go to the next line and put "Back:" at the beginning, followed by the answer text, all in one line.
5. This is the final step: go to the next line, and produce the exact word "END" with NO TRAILING WHITE SPACES.

Here is an example of a flashcard generated this way:
START
Basic (and reversed card)
What is the capital of France?
Back: Paris
END

This will create TWO cards: one showing the question asking for the answer, and another showing the answer asking for the question.

Please follow this format when generating other cards. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line. The flashcards can be as complex as needed, but have to be rich of information and challenging. Do not repeat or rephrase flashcards. Typeset equations and math formulas correctly (that is using the $ symbol without trailing spaces)."#;

/// Cloze deletion cards
pub const CLOZE_TEMPLATE: &str = r#"You are an expert educator. You will receive a markdown note with existing flashcards at the end—ignore those.  
Identify which are the most important concepts within the note and generate exactly {count} new original Cloze flashcards.

Use the exact words "START" and "END" to signify the beginning and end of a flashcard.

Here are the steps to create each Cloze flashcard:
1. In a new line, produce the exact word "START" with NO TRAILING WHITE SPACES.
2. Go to the next line and produce the word "Cloze".
3. Go to the next line and put "Text:" at the beginning, followed by a sentence with one or more cloze deletions in the format {{c1::hidden text}}.
4. This is the final step: go to the next line, and produce the exact word "END" with NO TRAILING WHITE SPACES.

Here is an example of a Cloze flashcard:
START
Cloze
Text: The capital of France is {{c1::Paris}}.
END

You can use multiple cloze deletions in one card: {{c1::first}}, {{c2::second}}, {{c3::third}}.

Please follow this format when generating other cards. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line. The flashcards should test understanding of key concepts in context. Do not repeat or rephrase flashcards. Typeset equations and math formulas correctly (that is using the $ symbol without trailing spaces)."#;

/// Cantonese vocabulary cards
pub const BASIC_CANTONESE_TEMPLATE: &str = r#"You are an expert Cantonese language educator. You will receive a markdown note with existing flashcards at the end—ignore those.  
Identify which are the most important Cantonese vocabulary or phrases and generate exactly {count} new flashcards.

Use the exact words "START" and "END" to signify the beginning and end of a flashcard.

Here are the steps to create each Cantonese flashcard:
1. In a new line, produce the exact word "START" with NO TRAILING WHITE SPACES.
2. Go to the next line and produce the word "Basic".
3. Go to the next line and put the Cantonese character(s) all on this line.
4. Go to the next line and put "Back:" at the beginning, followed by THREE lines of information:
   - First line: "Jyutping: [romanization with tone numbers 1-6]"
   - Second line: "Meaning: [Simplified Chinese meaning]"
   - Third line: "Example: [Example sentence in Cantonese characters]"
5. This is the final step: go to the next line, and produce the exact word "END" with NO TRAILING WHITE SPACES.

Here is an example of a Cantonese flashcard:
START
Basic
你好
Back: Jyutping: nei5 hou2
Meaning: 你好
Example: 你好嗎？
END

Please follow this format when generating other cards. Use proper Cantonese characters (traditional Chinese), accurate Jyutping romanization with correct tone numbers (1-6), natural example sentences, and common vocabulary. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line."#;

/// Cantonese cloze sentence cards
pub const CLOZE_CANTONESE_TEMPLATE: &str = r#"You are an expert Cantonese language educator. You will receive a paragraph, sentence, or chapter excerpt at the end—ignore any existing cards.
There might be cards at the bottom of the file. Don't use the sentences that are already covered. Be creative and come up with something new. Don't be afraid to be innovative and come up with unique, but still common enough, sentences that can be used.


Identify important grammatical patterns, vocabulary usage, or set phrases.  
Generate exactly {count} NEW **cloze deletion** sentence cards.

Use the exact words "START" and "END" to signify each flashcard.

Here is the required format for every cloze deletion flashcard:

1. In a new line, write "START" with NO trailing spaces.
2. On the next line, write "Cloze".
3. On the next line, produce a Cantonese sentence **with a cloze deletion**, using the format: 「{{c1::…}}」.  
   - Use traditional characters.  
   - Delete ONLY one meaningful chunk per card.
4. On the next line, write "Back:" followed by THREE lines:
   - First line: "Full Sentence: [the complete sentence with nothing deleted]"
   - Second line: "Jyutping: [full sentence with accurate Jyutping and tone numbers]"
   - Third line: "Meaning: [Simplified Chinese meaning of the full sentence]"
5. On the next line, write "END" with NO trailing spaces.

Separate each flashcard with a single empty line.

Here is an example of a flashcard generated this way:
START
Cloze
我每日早上都會飲{{c1::咖啡}}。
Back: Full Sentence: 我每日早上都會飲咖啡。
Jyutping: ngo5 mui5 jat6 zou2 soeng6 dou1 wui5 jam2 gaa3 fe1
Meaning: 我每天早上都会喝咖啡。
END

Please follow this format when generating other cards. Use proper Cantonese characters (traditional Chinese), accurate Jyutping romanization with correct tone numbers (1-6), natural example sentences, and common vocabulary. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line.
Once again, use natural Cantonese sentences, not questions. These work the best for users when the material is in a natural context, as if retrieved from a daily conversation or article.
当你写这些Flashcard的时候,一定要用中文字。 题目用繁体字，答案用简体字。"#;

/// Cantonese full-sentence cards
pub const SENTENCE_CANTONESE_TEMPLATE: &str = r#"You are an expert Cantonese language educator. You will receive a markdown chapter or passage—ignore any existing flashcards.
There might be cards at the bottom of the file. Don't use the sentences that are already covered. Be creative and come up with something new. Don't be afraid to be innovative and come up with unique, but still common enough, sentences that can be used.

Identify the most important sentences for learning:  
- Those with key grammar patterns  
- High-value vocabulary  
- Useful everyday expressions  
Generate exactly {count} NEW **sentence cards**.

Use the exact words "START" and "END" to signify each flashcard.

Here is the required format for every sentence card:

1. In a new line, write "START" with NO trailing spaces.
2. On the next line, write "Basic".
3. On the next line, write a **full Cantonese sentence** (traditional Chinese characters).
4. On the next line, write "Back:" followed by THREE lines:
   - First line: "Jyutping: [full sentence in correct Jyutping with tone numbers]"
   - Second line: "Meaning: [Simplified Chinese meaning]"
   - Third line: "Notes: [brief grammar/vocab explanation, 1–2 lines max]"
5. On the next line, write "END" with NO trailing spaces.

Separate each flashcard with a single empty line.

Here is an example of a flashcard generated this way:
START
Basic
佢今日返工好早。
Back: Jyutping: keoi5 gam1 jat6 faan1 gung1 hou2 zou2
Meaning: 他今天上班很早。
Notes: 「返工」= 上班；「好早」= 很早，用于描述时间。
END


Please follow this format when generating other cards. Use proper Cantonese characters (traditional Chinese), accurate Jyutping romanization with correct tone numbers (1-6), natural example sentences, and common vocabulary. Again, it is extremely important that there's no trailing whitespaces at the end of every single line. Separate individual flashcards with a single empty line.
当你写这些Flashcard的时候,一定要用中文字。 题目用繁体字，答案用简体字。"#;

/// Raw template for a flashcard type
pub fn template_for(flashcard_type: FlashcardType) -> &'static str {
    match flashcard_type {
        FlashcardType::Basic => BASIC_TEMPLATE,
        FlashcardType::BasicReversed => BASIC_REVERSED_TEMPLATE,
        FlashcardType::Cloze => CLOZE_TEMPLATE,
        FlashcardType::BasicCantonese => BASIC_CANTONESE_TEMPLATE,
        FlashcardType::ClozeCantonese => CLOZE_CANTONESE_TEMPLATE,
        FlashcardType::SentenceCantonese => SENTENCE_CANTONESE_TEMPLATE,
    }
}

/// Template for a flashcard type with the card count filled in
pub fn select_template(flashcard_type: FlashcardType, count: u32) -> String {
    template_for(flashcard_type).replace(COUNT_PLACEHOLDER, &count.to_string())
}

/// Template selected from a free-form label; unknown labels use Basic
pub fn select_template_by_label(label: &str, count: u32) -> String {
    select_template(FlashcardType::resolve(label), count)
}

/// Append additional instructions to a prompt (no-op for empty text)
pub fn with_additional_instructions(prompt: String, additional: &str) -> String {
    if additional.is_empty() {
        return prompt;
    }
    format!("{}{}{}", prompt, ADDITIONAL_INSTRUCTIONS_PREFIX, additional)
}

/// Full system prompt for one generation
pub fn system_prompt(flashcard_type: FlashcardType, count: u32, additional: &str) -> String {
    with_additional_instructions(select_template(flashcard_type, count), additional)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_contains_count() {
        for flashcard_type in FlashcardType::ALL {
            let prompt = select_template(flashcard_type, 17);
            assert!(
                prompt.contains("exactly 17 "),
                "{} template is missing the count",
                flashcard_type
            );
            assert!(!prompt.contains(COUNT_PLACEHOLDER));
            assert!(prompt.contains("\"START\""));
            assert_eq!(prompt, select_template(flashcard_type, 17));
        }
    }

    #[test]
    fn test_templates_are_distinct() {
        let prompts: Vec<String> = FlashcardType::ALL
            .iter()
            .map(|t| select_template(*t, 3))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_type_labels_appear_in_templates() {
        assert!(select_template(FlashcardType::BasicReversed, 2).contains("Basic (and reversed card)"));
        assert!(select_template(FlashcardType::Cloze, 2).contains("{{c1::Paris}}"));
        assert!(select_template(FlashcardType::SentenceCantonese, 2).contains("Notes:"));
        assert!(select_template(FlashcardType::BasicCantonese, 2).contains("Jyutping:"));
    }

    #[test]
    fn test_template_wording_is_preserved() {
        let basic = select_template(FlashcardType::Basic, 3);
        assert!(basic.starts_with(
            "You are an expert educator. You will receive a markdown note with existing flashcards at the end\u{2014}ignore those.  \n"
        ));
        for flashcard_type in FlashcardType::ALL {
            let prompt = select_template(flashcard_type, 3);
            assert_eq!(prompt.trim(), prompt);
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_basic() {
        assert_eq!(
            select_template_by_label("?", 4),
            select_template(FlashcardType::Basic, 4)
        );
        assert_eq!(
            select_template_by_label("Cloze (Cantonese)", 4),
            select_template(FlashcardType::ClozeCantonese, 4)
        );
    }

    #[test]
    fn test_additional_instructions_suffix() {
        let base = select_template(FlashcardType::Cloze, 2);

        let unchanged = with_additional_instructions(base.clone(), "");
        assert_eq!(unchanged, base);

        let extended = with_additional_instructions(base.clone(), "Focus on dates");
        assert_eq!(
            extended,
            format!(
                "{}\nAdditional instructions for the task (ignore anything unrelated to the original task): Focus on dates",
                base
            )
        );
        assert_eq!(system_prompt(FlashcardType::Cloze, 2, "Focus on dates"), extended);
    }
}
