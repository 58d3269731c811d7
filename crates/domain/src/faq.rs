use common::FaqId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::validation;

/// A frequently asked question shown on the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    /// Ascending sort key for listings.
    pub display_order: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

impl Faq {
    pub fn create(new: NewFaq) -> Result<Self, DomainError> {
        validation::required("question", &new.question, 300)?;
        validation::required("answer", &new.answer, 2000)?;
        validation::optional("category", new.category.as_deref(), 50)?;

        Ok(Self {
            id: FaqId::new(),
            question: new.question,
            answer: new.answer,
            category: new.category,
            display_order: new.display_order.unwrap_or(0),
            active: new.active.unwrap_or(true),
        })
    }

    pub fn apply(&mut self, patch: FaqPatch) -> Result<(), DomainError> {
        if let Some(question) = &patch.question {
            validation::required("question", question, 300)?;
        }
        if let Some(answer) = &patch.answer {
            validation::required("answer", answer, 2000)?;
        }
        validation::optional("category", patch.category.as_deref(), 50)?;

        if let Some(question) = patch.question {
            self.question = question;
        }
        if let Some(answer) = patch.answer {
            self.answer = answer;
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(order) = patch.display_order {
            self.display_order = order;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }

    /// Case-insensitive substring match over the question.
    pub fn question_matches(&self, text: &str) -> bool {
        self.question.to_lowercase().contains(&text.to_lowercase())
    }
}
