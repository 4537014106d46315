mod bypass;
mod cond;
mod dynamic;
mod dynlist;
mod once;
mod optional;
mod re_lex;
mod repeat;
mod sh_lex;
