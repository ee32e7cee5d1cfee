//! Built-in course material loaded into a fresh store.

use super::models::{QuizOption, QuizQuestion, Section};

pub(crate) const COURSE_TITLE: &str = "Understanding Transformer Models";
pub(crate) const COURSE_DESCRIPTION: &str =
    "Learn about the architecture and implementation of transformer-based language models";

pub(crate) fn sections() -> Vec<Section> {
    [
        (
            "Introduction to Transformer Models",
            "introduction",
            "Transformer models have revolutionized NLP by replacing recurrence with attention. \
             Instead of reading a sentence one word at a time, a transformer looks at every \
             token at once and learns which tokens matter to each other.",
        ),
        (
            "Transformer Architecture Overview",
            "architecture",
            "The Transformer architecture consists of an encoder-decoder structure. Each side \
             stacks identical layers built from multi-head attention, a position-wise \
             feed-forward network, residual connections, and layer normalization.",
        ),
        (
            "Embeddings & Positional Encoding",
            "embeddings",
            "Before words can be processed by the Transformer architecture, they are mapped to \
             dense embedding vectors. Because attention has no notion of order, a positional \
             encoding is added so the model can tell the first token from the last.",
        ),
        (
            "Self-Attention Mechanism",
            "attention",
            "The self-attention mechanism is at the heart of the Transformer architecture. Each \
             token produces a query, a key, and a value; scaled dot products between queries and \
             keys are passed through a softmax to weight the values.",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, slug, content))| Section {
        id: i as u32 + 1,
        title: title.to_string(),
        slug: slug.to_string(),
        order: i as u32 + 1,
        content: content.to_string(),
    })
    .collect()
}

pub(crate) fn quiz_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            id: 1,
            question: "What's the main advantage of self-attention over recurrent neural networks?"
                .into(),
            options: options(&[
                ("a", "Self-attention requires less memory"),
                ("b", "Self-attention creates smaller models"),
                ("c", "Self-attention allows parallelization of sequence processing"),
                ("d", "Self-attention automatically improves accuracy"),
            ]),
            correct_answer: "c".into(),
            explanation: "Self-attention allows the model to process all tokens in the sequence \
                          in parallel, unlike RNNs which must process tokens sequentially."
                .into(),
        },
        QuizQuestion {
            id: 2,
            question: "What is the purpose of the scaling factor in the attention formula?".into(),
            options: options(&[
                ("a", "To reduce the model's memory usage"),
                ("b", "To stabilize gradients during training"),
                ("c", "To make the model run faster"),
                ("d", "To increase the attention span"),
            ]),
            correct_answer: "b".into(),
            explanation: "The scaling factor prevents the dot products from growing too large in \
                          magnitude, which would push the softmax function into regions with very \
                          small gradients."
                .into(),
        },
    ]
}

fn options(pairs: &[(&str, &str)]) -> Vec<QuizOption> {
    pairs
        .iter()
        .map(|(id, text)| QuizOption {
            id: id.to_string(),
            text: text.to_string(),
        })
        .collect()
}
