//! Static class-label to category lookup used to enrich detection listings.

/// Category reported for labels missing from the table
pub const UNKNOWN_CATEGORY: &str = "Unknown Object";

const CATEGORIES: &[(&str, &str)] = &[
    ("person", "Human Being"),
    ("car", "Vehicle - Car"),
    ("motorcycle", "Vehicle - Motorcycle"),
    ("bus", "Vehicle - Bus"),
    ("truck", "Vehicle - Truck"),
    ("bicycle", "Vehicle - Bicycle"),
    ("traffic light", "Traffic Signal"),
    ("stop sign", "Road Sign - Stop"),
    ("chair", "Furniture - Chair"),
    ("sofa", "Furniture - Sofa"),
    ("bed", "Furniture - Bed"),
    ("dining table", "Furniture - Table"),
    ("tv", "Electronics - Television"),
    ("laptop", "Electronics - Laptop"),
    ("mouse", "Electronics - Computer Mouse"),
    ("keyboard", "Electronics - Keyboard"),
    ("cell phone", "Electronics - Mobile Phone"),
    ("book", "Stationery - Book"),
    ("clock", "Decor - Clock"),
    ("vase", "Decor - Vase"),
    ("scissors", "Tool - Scissors"),
    ("teddy bear", "Toy - Teddy Bear"),
    ("hair drier", "Appliance - Hair Dryer"),
    ("toothbrush", "Personal Care - Toothbrush"),
    ("bowl", "Kitchenware - Bowl"),
    ("banana", "Food - Banana"),
    ("apple", "Food - Apple"),
    ("sandwich", "Food - Sandwich"),
    ("orange", "Food - Orange"),
    ("broccoli", "Food - Broccoli"),
    ("carrot", "Food - Carrot"),
    ("hot dog", "Food - Hot Dog"),
    ("pizza", "Food - Pizza"),
    ("donut", "Food - Donut"),
    ("cake", "Food - Cake"),
    ("bottle", "Container - Bottle"),
    ("wine glass", "Container - Wine Glass"),
    ("cup", "Container - Cup"),
    ("fork", "Utensil - Fork"),
    ("knife", "Utensil - Knife"),
    ("spoon", "Utensil - Spoon"),
];

/// Category for a class label, or [`UNKNOWN_CATEGORY`]
pub fn category_for(label: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == label)
        .map_or(UNKNOWN_CATEGORY, |&(_, category)| category)
}

/// Number of labels with a known category
pub fn category_count() -> usize {
    CATEGORIES.len()
}
