use std::path::Path;

use log::info;

use crate::error::Result;
use crate::schema::ExtractedContent;

/// Loads the bundle written by the upstream PDF extractor. Relative image
/// paths are resolved against the bundle's directory.
pub async fn load_extracted_content(path: &Path) -> Result<ExtractedContent> {
    let raw = tokio::fs::read_to_string(path).await?;
    let mut content: ExtractedContent = serde_json::from_str(&raw)?;

    if let Some(base) = path.parent() {
        for image in content.image_paths.iter_mut() {
            if image.is_relative() {
                *image = base.join(&*image);
            }
        }
    }

    info!(
        "Loaded {} tables, {} text elements and {} images from {}",
        content.table_elements.len(),
        content.text_elements.len(),
        content.image_paths.len(),
        path.display()
    );
    Ok(content)
}
