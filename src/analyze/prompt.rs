// src/analyze/prompt.rs
//! Study-note instruction template. The three headings are fixed so the
//! digest can render the answer without parsing it.

pub const SECTION_HEADINGS: [&str; 3] = [
    "Core Concepts",
    "Key Takeaways",
    "Notable Examples or Analogies",
];

pub const SYSTEM_ROLE: &str = "You are an expert academic assistant who turns lecture transcripts into study notes.";

/// Cut `text` to at most `max_chars` chars, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn build_prompt(transcript: &str, title: &str, max_transcript_chars: usize) -> String {
    let body = truncate_chars(transcript, max_transcript_chars);
    let [core, takeaways, examples] = SECTION_HEADINGS;
    format!(
        r#"Create detailed, high-quality notes from the transcript of an educational video titled "{title}".

The notes should be structured, easy to read, and capture the core concepts, key arguments, and any important examples mentioned. Do not just summarize; explain the concepts as if you were writing a study guide.

Follow this format exactly:

### {core}
*   **[Concept name]:** A clear and concise explanation of the concept.

### {takeaways}
*   **[Takeaway]:** A critical insight or conclusion.

### {examples}
*   **[Example]:** An example or analogy the speaker used to clarify a point.

Now analyze the following transcript and write the notes:

TRANSCRIPT:
"{body}"
"#
    )
}
