//! # Copulas
//!
//! $$
//! F(x_1,x_2)=C\big(F_1(x_1),F_2(x_2)\big)
//! $$
//!
pub mod bivariate;
pub mod marginals;
pub mod parameters;
pub mod rosenblatt;
