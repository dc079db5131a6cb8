pub mod ai_service;
pub mod document_service;
pub mod extractor;
