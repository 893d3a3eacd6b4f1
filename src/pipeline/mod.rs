pub mod text;
pub mod segmentation; // Stage 1: context-anchored segments
pub mod entities; // Stage 2: typed medical entities
pub mod temporal; // Stage 3: dates, events and timeline
pub mod quality; // Stage 4: four-dimension quality report
pub mod processor; // Orchestrator: pages in, case bundle out
pub mod batch;
pub mod ingest; // OCR JSON to pages
pub mod date_audit;
