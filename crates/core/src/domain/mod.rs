pub mod discount;
pub mod price_class;
pub mod sales_price;
