mod routing;
mod team;
