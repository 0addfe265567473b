pub mod d100_admin_summary;
