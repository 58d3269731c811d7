//! Frequently asked questions.

use common::FaqId;
use domain::{Faq, FaqPatch, NewFaq};
use store::{FaqQuery, Store};

use crate::error::{Result, ServiceError};

pub struct FaqService<S: Store> {
    store: S,
}

impl<S: Store> FaqService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Active FAQs in display order.
    pub async fn active_faqs(&self) -> Result<Vec<Faq>> {
        Ok(self.store.list_faqs(FaqQuery::active()).await?)
    }

    pub async fn all_faqs(&self) -> Result<Vec<Faq>> {
        Ok(self.store.list_faqs(FaqQuery::new()).await?)
    }

    pub async fn get_faq(&self, id: FaqId) -> Result<Faq> {
        self.store
            .get_faq(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Faq", id))
    }

    pub async fn faqs_in_category(&self, category: &str) -> Result<Vec<Faq>> {
        Ok(self
            .store
            .list_faqs(FaqQuery::active().category(category))
            .await?)
    }

    pub async fn search_faqs(&self, text: &str) -> Result<Vec<Faq>> {
        Ok(self
            .store
            .list_faqs(FaqQuery::active().question_contains(text))
            .await?)
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.store.faq_categories().await?)
    }

    #[tracing::instrument(skip(self, new))]
    pub async fn create_faq(&self, new: NewFaq) -> Result<Faq> {
        Ok(self.store.insert_faq(Faq::create(new)?).await?)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_faq(&self, id: FaqId, patch: FaqPatch) -> Result<Faq> {
        let mut faq = self.get_faq(id).await?;
        faq.apply(patch)?;
        Ok(self.store.update_faq(faq).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_faq(&self, id: FaqId) -> Result<()> {
        Ok(self.store.delete_faq(id).await?)
    }
}
