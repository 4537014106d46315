mod any;
mod empty;
mod file;
mod int;
mod literal;
mod regex_field;
mod space;
